//! The projection engine.
//!
//! [`GraphQLDataSource`] ties the pieces together: it substitutes request
//! variables into query text, fans the target requests and the memoized
//! schema fetch out concurrently, joins them, and runs the synchronous
//! projection pipeline — records, lock-step schema and query resolution,
//! grouping, typing, titles — to produce frames. The same projection also
//! feeds annotation events and variable-lookup values.
//!
//! ```text
//! targets ──▶ template substitution ──▶ transport ─┐
//!                                                  ├─ join ─▶ project ─▶ frames
//! introspection (memoized) ────────────────────────┘
//! ```
//!
//! Failure of any target request, the schema fetch, or any per-path
//! resolution fails the whole request; per-path failures are not isolated.

pub mod annotations;
pub mod frames;
pub mod lookup;
pub mod records;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;

pub use annotations::AnnotationEvent;
pub use frames::{Column, FieldType, Frame, FrameSettings, ResolvedPath};
pub use lookup::MetricValue;
pub use records::project_records;

use crate::config::{AnnotationQuery, TargetQuery, VariableQuery};
use crate::error::{ProjectionError, ProjectionResult};
use crate::graphql;
use crate::path::{parse_data_paths, split_list, DataPath};
use crate::schema::resolve::type_of_descendant;
use crate::schema::SchemaClient;
use crate::template::{ScopedVars, TemplateResolver, TextValuePair};
use crate::transport::{ResponseEnvelope, Transport};
use crate::variables::{resolve_variables, VariableSource};

use annotations::build_annotations;
use frames::build_frames;
use lookup::build_lookup_values;

/// Query used by the health check: cheap, and exercises auth and schema
/// availability in one round trip.
pub const HEALTH_CHECK_QUERY: &str = "{\n  __schema{\n    queryType{name}\n  }\n}";

/// The request time range, bound to `timeFrom`/`timeTo` during query-text
/// substitution as epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// One frame-producing request.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub targets: Vec<TargetQuery>,
    pub range: Option<TimeRange>,
    pub scoped_vars: ScopedVars,
}

/// One annotation request.
#[derive(Debug, Clone, Default)]
pub struct AnnotationRequest {
    pub annotation: AnnotationQuery,
    pub range: Option<TimeRange>,
}

/// Health-check outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Success,
    Error,
}

/// Health-check report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub message: String,
}

impl HealthStatus {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: HealthState::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthState::Error,
            message: message.into(),
        }
    }
}

/// A GraphQL data source: projection engine plus its collaborators.
pub struct GraphQLDataSource {
    transport: Arc<dyn Transport>,
    templates: Arc<dyn TemplateResolver>,
    variables: Option<Arc<dyn VariableSource>>,
    schema: SchemaClient,
}

impl GraphQLDataSource {
    pub fn new(transport: Arc<dyn Transport>, templates: Arc<dyn TemplateResolver>) -> Self {
        Self {
            schema: SchemaClient::new(transport.clone()),
            transport,
            templates,
            variables: None,
        }
    }

    /// Attach a host variable source, used to substitute user variables
    /// into variable-lookup queries.
    pub fn with_variable_source(mut self, source: Arc<dyn VariableSource>) -> Self {
        self.variables = Some(source);
        self
    }

    // =========================================================================
    // Main query path
    // =========================================================================

    /// Run every target and project the grouped, typed frames.
    pub async fn query(&self, request: &QueryRequest) -> ProjectionResult<Vec<Frame>> {
        if request.targets.is_empty() {
            return Ok(Vec::new());
        }

        let request_vars = self.request_vars(&request.scoped_vars, request.range.as_ref());
        let payloads: Vec<String> = request
            .targets
            .iter()
            .map(|target| self.templates.replace(&target.query_text, &request_vars))
            .collect();

        // Fan out every target request together with the (memoized) schema
        // fetch, and join
        let (envelopes, registry) = tokio::try_join!(
            try_join_all(payloads.iter().map(|payload| self.post_query(payload))),
            self.schema.registry()
        )?;

        // Parse the query so aliases can be resolved. The query produced the
        // results being projected, so resolution failures are configuration
        // errors. Host `${...}` tokens clash with GraphQL syntax and are
        // munged away first.
        let munged = graphql::munge_host_variables(&request.targets[0].query_text);
        let parsed = graphql::parse(&munged);
        if parsed.has_errors() {
            let messages: Vec<String> = parsed.errors().map(|d| d.message.clone()).collect();
            return Err(ProjectionError::Query(messages.join("; ")));
        }
        let operation = parsed
            .operation()
            .ok_or_else(|| ProjectionError::Query("no operation in query".to_string()))?;

        let query_root = registry.query_type()?;

        let mut all_frames = Vec::new();
        for (target, envelope) in request.targets.iter().zip(&envelopes) {
            let group_by = split_list(&target.group_by);
            for path in parse_data_paths(&target.data_path)? {
                let records = project_records(envelope, &path)?;

                let schema_type = type_of_descendant(registry, query_root, &path)?;
                if !schema_type.is_object() {
                    // Non-object leaf collections cannot be tabulated as
                    // multi-field rows
                    return Err(ProjectionError::TypeMismatch {
                        path: path.to_string(),
                        component: last_component(&path),
                        found: schema_type.name().to_string(),
                    });
                }

                let query_node = graphql::descendant_field(operation, &path)?;
                if !query_node.has_selection_set() {
                    return Err(ProjectionError::NoSelectionSet {
                        field: query_node.response_name().to_string(),
                        index: path.components().len().saturating_sub(1),
                        path: path.to_string(),
                    });
                }

                let resolved = ResolvedPath {
                    path: &path,
                    schema_type,
                    query_node,
                };
                let settings = FrameSettings {
                    time_path: &target.time_path,
                    time_format: target.time_format(),
                    group_by: &group_by,
                    alias_by: target.alias_by(),
                    scoped_vars: &request.scoped_vars,
                    templates: self.templates.as_ref(),
                };
                all_frames.extend(build_frames(records, resolved, registry, &settings)?);
            }
        }
        Ok(all_frames)
    }

    // =========================================================================
    // Annotation path
    // =========================================================================

    /// Run an annotation query and derive one event per projected record.
    pub async fn annotations(
        &self,
        request: &AnnotationRequest,
    ) -> ProjectionResult<Vec<AnnotationEvent>> {
        let request_vars = self.request_vars(&ScopedVars::new(), request.range.as_ref());
        let payload = self
            .templates
            .replace(&request.annotation.target.query_text, &request_vars);
        let envelope = self.post_query(&payload).await?;

        let mut events = Vec::new();
        for path in parse_data_paths(&request.annotation.target.data_path)? {
            let records = project_records(&envelope, &path)?;
            events.extend(build_annotations(&records, &request.annotation));
        }
        Ok(events)
    }

    // =========================================================================
    // Variable-lookup path
    // =========================================================================

    /// Run a variable-lookup query and derive text/value entries.
    pub async fn metric_find(&self, query: &VariableQuery) -> ProjectionResult<Vec<MetricValue>> {
        let vars = self.host_variables();
        let payload = self.templates.replace(&query.query_text, &vars);
        let envelope = self.post_query(&payload).await?;

        let records = project_records(&envelope, &DataPath::parse(query.data_path.as_str()))?;
        Ok(build_lookup_values(&records))
    }

    // =========================================================================
    // Health check and variables
    // =========================================================================

    /// Probe the endpoint with a minimal introspection query.
    pub async fn test_datasource(&self) -> HealthStatus {
        match self.post_query(HEALTH_CHECK_QUERY).await {
            Ok(envelope) => match envelope.first_error() {
                Some(error) => HealthStatus::error(format!("GraphQL Error: {}", error.message)),
                None => HealthStatus::success("Success"),
            },
            Err(ProjectionError::Transport(err)) => {
                tracing::warn!(%err, "health check transport failure");
                HealthStatus::error(err.status_line())
            }
            Err(err) => HealthStatus::error(err.to_string()),
        }
    }

    /// Currently defined host variables, filtered to supported kinds with
    /// the all-sentinel resolved.
    pub fn host_variables(&self) -> ScopedVars {
        match &self.variables {
            Some(source) => resolve_variables(source.as_ref()),
            None => ScopedVars::new(),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn post_query(&self, payload: &str) -> ProjectionResult<ResponseEnvelope> {
        tracing::debug!(len = payload.len(), "posting query");
        self.transport
            .request(payload)
            .await
            .map_err(|err| ProjectionError::Transport(err.normalize()))
    }

    /// Request-time variables: the caller's scoped vars plus the time range
    /// bound as epoch milliseconds.
    fn request_vars(&self, scoped: &ScopedVars, range: Option<&TimeRange>) -> ScopedVars {
        let mut vars = scoped.clone();
        if let Some(range) = range {
            vars.insert(
                "timeFrom".to_string(),
                TextValuePair::new("from", range.from.timestamp_millis()),
            );
            vars.insert(
                "timeTo".to_string(),
                TextValuePair::new("to", range.to.timestamp_millis()),
            );
        }
        vars
    }
}

fn last_component(path: &DataPath) -> String {
    path.components()
        .last()
        .map(|component| component.as_str().to_string())
        .unwrap_or_default()
}
