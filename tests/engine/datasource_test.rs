//! End-to-end engine tests against a canned transport: the full query
//! path (fan-out, join, lock-step resolution, frames), the annotation and
//! variable-lookup paths, the health check, and schema-fetch memoization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use frameql::config::{AnnotationQuery, TargetQuery, VariableQuery};
use frameql::engine::{
    AnnotationRequest, FieldType, GraphQLDataSource, HealthState, QueryRequest, TimeRange,
};
use frameql::error::ProjectionError;
use frameql::template::NoopResolver;
use frameql::transport::{ResponseEnvelope, Transport, TransportError, TransportResult};
use frameql::value::CellValue;
use serde_json::{json, Value};

/// Canned transport: answers the introspection query from a fixed schema
/// and everything else from a fixed response body, counting introspection
/// fetches.
struct FakeTransport {
    body: Value,
    introspection_count: AtomicUsize,
    fail_with: Option<fn() -> TransportError>,
}

impl FakeTransport {
    fn new(body: Value) -> Self {
        Self {
            body,
            introspection_count: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    fn failing(fail_with: fn() -> TransportError) -> Self {
        Self {
            body: json!({}),
            introspection_count: AtomicUsize::new(0),
            fail_with: Some(fail_with),
        }
    }

    fn introspection_fetches(&self) -> usize {
        self.introspection_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(&self, query: &str) -> TransportResult<ResponseEnvelope> {
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        if query.contains("IntrospectionQuery") {
            self.introspection_count.fetch_add(1, Ordering::SeqCst);
            return Ok(ResponseEnvelope {
                data: introspection_body(),
                errors: None,
            });
        }
        serde_json::from_value(self.body.clone())
            .map_err(|err| TransportError::Other(err.to_string()))
    }
}

fn introspection_body() -> Value {
    json!({
        "__schema": {
            "queryType": {"name": "Query"},
            "types": [
                {
                    "kind": "OBJECT",
                    "name": "Query",
                    "fields": [
                        {"name": "servers", "type": {
                            "kind": "LIST", "name": null,
                            "ofType": {"kind": "OBJECT", "name": "Server"}
                        }},
                        {"name": "events", "type": {
                            "kind": "LIST", "name": null,
                            "ofType": {"kind": "OBJECT", "name": "Event"}
                        }}
                    ]
                },
                {
                    "kind": "OBJECT",
                    "name": "Server",
                    "fields": [
                        {"name": "name", "type": {"kind": "SCALAR", "name": "String"}},
                        {"name": "load", "type": {"kind": "SCALAR", "name": "Float"}},
                        {"name": "Time", "type": {"kind": "SCALAR", "name": "String"}}
                    ]
                },
                {
                    "kind": "OBJECT",
                    "name": "Event",
                    "fields": [
                        {"name": "startedAt", "type": {"kind": "SCALAR", "name": "String"}},
                        {"name": "service", "type": {"kind": "SCALAR", "name": "String"}}
                    ]
                },
                {"kind": "SCALAR", "name": "String"},
                {"kind": "SCALAR", "name": "Float"},
                {"kind": "SCALAR", "name": "Int"}
            ]
        }
    })
}

fn server_body() -> Value {
    json!({
        "data": {
            "servers": [
                {"name": "a", "load": 0.5, "Time": "2024-07-15T10:00:00Z"},
                {"name": "b", "load": 0.7, "Time": "2024-07-15T10:00:00Z"},
                {"name": "a", "load": 0.6, "Time": "2024-07-15T10:01:00Z"},
            ]
        }
    })
}

fn datasource(transport: Arc<FakeTransport>) -> GraphQLDataSource {
    GraphQLDataSource::new(transport, Arc::new(NoopResolver))
}

fn server_target() -> TargetQuery {
    TargetQuery {
        query_text: "query { servers { name load Time } }".to_string(),
        data_path: "servers".to_string(),
        group_by: "name".to_string(),
        ..TargetQuery::default()
    }
}

fn range() -> TimeRange {
    TimeRange {
        from: Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap(),
        to: Utc.with_ymd_and_hms(2024, 7, 16, 0, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_query_produces_grouped_typed_frames() {
    let transport = Arc::new(FakeTransport::new(server_body()));
    let source = datasource(transport.clone());

    let request = QueryRequest {
        targets: vec![server_target()],
        range: Some(range()),
        scoped_vars: Default::default(),
    };
    let frames = source.query(&request).await.expect("query succeeds");

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].group_key(), "a");
    assert_eq!(frames[1].group_key(), "b");
    assert_eq!(frames[0].row_count(), 2);

    let load = frames[0].column("load").expect("load column");
    assert_eq!(load.field_type(), FieldType::Number);
    assert_eq!(load.display_name(), "a_load");

    let time = frames[0].column("Time").expect("Time column");
    assert_eq!(time.field_type(), FieldType::Time);
    assert!(matches!(time.values()[0], CellValue::Time(_)));
}

#[tokio::test]
async fn test_schema_fetch_is_memoized_across_queries() {
    let transport = Arc::new(FakeTransport::new(server_body()));
    let source = datasource(transport.clone());

    let request = QueryRequest {
        targets: vec![server_target()],
        range: None,
        scoped_vars: Default::default(),
    };
    source.query(&request).await.expect("first query succeeds");
    source.query(&request).await.expect("second query succeeds");

    assert_eq!(transport.introspection_fetches(), 1);
}

#[tokio::test]
async fn test_concurrent_queries_share_one_introspection_fetch() {
    let transport = Arc::new(FakeTransport::new(server_body()));
    let source = datasource(transport.clone());

    let request = QueryRequest {
        targets: vec![server_target()],
        range: None,
        scoped_vars: Default::default(),
    };
    let (first, second) = tokio::join!(source.query(&request), source.query(&request));
    first.expect("first query succeeds");
    second.expect("second query succeeds");

    assert_eq!(transport.introspection_fetches(), 1);
}

#[tokio::test]
async fn test_multiple_data_paths_emit_frames_per_path() {
    let transport = Arc::new(FakeTransport::new(server_body()));
    let source = datasource(transport);

    let target = TargetQuery {
        data_path: "servers, servers".to_string(),
        ..server_target()
    };
    let request = QueryRequest {
        targets: vec![target],
        range: None,
        scoped_vars: Default::default(),
    };
    let frames = source.query(&request).await.expect("query succeeds");
    assert_eq!(frames.len(), 4);
}

#[tokio::test]
async fn test_empty_data_path_fails() {
    let transport = Arc::new(FakeTransport::new(server_body()));
    let source = datasource(transport);

    let target = TargetQuery {
        data_path: "  ,  ".to_string(),
        ..server_target()
    };
    let request = QueryRequest {
        targets: vec![target],
        range: None,
        scoped_vars: Default::default(),
    };
    assert!(matches!(
        source.query(&request).await,
        Err(ProjectionError::EmptyPath)
    ));
}

#[tokio::test]
async fn test_non_object_data_path_fails_with_type_mismatch() {
    let transport = Arc::new(FakeTransport::new(json!({
        "data": {"servers": [{"name": "a"}]}
    })));
    let source = datasource(transport);

    let target = TargetQuery {
        query_text: "query { servers { name } }".to_string(),
        data_path: "servers.name".to_string(),
        group_by: String::new(),
        ..TargetQuery::default()
    };
    let request = QueryRequest {
        targets: vec![target],
        range: None,
        scoped_vars: Default::default(),
    };
    assert!(matches!(
        source.query(&request).await,
        Err(ProjectionError::TypeMismatch { .. })
    ));
}

#[tokio::test]
async fn test_scalar_selection_fails_with_no_selection_set() {
    let transport = Arc::new(FakeTransport::new(json!({
        "data": {"servers": [{"name": "a"}]}
    })));
    let source = datasource(transport);

    let target = TargetQuery {
        query_text: "query { servers }".to_string(),
        data_path: "servers".to_string(),
        group_by: String::new(),
        ..TargetQuery::default()
    };
    let request = QueryRequest {
        targets: vec![target],
        range: None,
        scoped_vars: Default::default(),
    };
    assert!(matches!(
        source.query(&request).await,
        Err(ProjectionError::NoSelectionSet { .. })
    ));
}

#[tokio::test]
async fn test_host_variable_tokens_parse_after_munging() {
    let transport = Arc::new(FakeTransport::new(server_body()));
    let source = datasource(transport);

    let target = TargetQuery {
        query_text: "query { servers(env: ${env}) { name load Time } }".to_string(),
        ..server_target()
    };
    let request = QueryRequest {
        targets: vec![target],
        range: None,
        scoped_vars: Default::default(),
    };
    let frames = source.query(&request).await.expect("query succeeds");
    assert_eq!(frames.len(), 2);
}

#[tokio::test]
async fn test_annotations() {
    let transport = Arc::new(FakeTransport::new(json!({
        "data": {
            "events": [
                {"startedAt": "2024-07-15T10:00:00Z", "service": "api"},
                {"startedAt": "2024-07-15T11:00:00Z", "service": "worker"},
            ]
        }
    })));
    let source = datasource(transport);

    let request = AnnotationRequest {
        annotation: AnnotationQuery {
            target: TargetQuery {
                query_text: "query { events { startedAt service } }".to_string(),
                data_path: "events".to_string(),
                time_path: "startedAt".to_string(),
                ..TargetQuery::default()
            },
            end_time_path: String::new(),
            annotation_title: "deploy $field_service".to_string(),
            annotation_text: String::new(),
            annotation_tags: "deploy".to_string(),
        },
        range: Some(range()),
    };

    let events = source.annotations(&request).await.expect("annotations build");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "deploy api");
    assert_eq!(events[1].title, "deploy worker");
    assert!(!events[0].is_region);
    assert!(events[0].time.is_some());
    assert_eq!(events[0].tags, vec!["deploy"]);
}

#[tokio::test]
async fn test_metric_find_with_reserved_keys() {
    let transport = Arc::new(FakeTransport::new(json!({
        "data": {
            "environments": [
                {"__text": "Production", "__value": "prod"},
                {"__text": "Development", "__value": "dev"},
            ]
        }
    })));
    let source = datasource(transport);

    let query = VariableQuery {
        query_text: "query { environments { __text __value } }".to_string(),
        data_path: "environments".to_string(),
    };
    let values = source.metric_find(&query).await.expect("lookup succeeds");

    assert_eq!(values.len(), 2);
    assert_eq!(values[0].text, "Production");
    assert_eq!(
        values[0].value,
        Some(CellValue::String("prod".to_string()))
    );
}

#[tokio::test]
async fn test_metric_find_without_reserved_keys() {
    let transport = Arc::new(FakeTransport::new(json!({
        "data": {"environments": [{"name": "prod"}, {"name": "dev"}]}
    })));
    let source = datasource(transport);

    let query = VariableQuery {
        query_text: "query { environments { name } }".to_string(),
        data_path: "environments".to_string(),
    };
    let values = source.metric_find(&query).await.expect("lookup succeeds");

    let texts: Vec<&str> = values.iter().map(|v| v.text.as_str()).collect();
    assert_eq!(texts, vec!["prod", "dev"]);
    assert!(values.iter().all(|v| v.value.is_none()));
}

#[tokio::test]
async fn test_health_check_success() {
    let transport = Arc::new(FakeTransport::new(json!({
        "data": {"__schema": {"queryType": {"name": "Query"}}}
    })));
    let source = datasource(transport);

    let status = source.test_datasource().await;
    assert_eq!(status.status, HealthState::Success);
}

#[tokio::test]
async fn test_health_check_reports_upstream_errors() {
    let transport = Arc::new(FakeTransport::new(json!({
        "data": null,
        "errors": [{"message": "introspection is disabled"}]
    })));
    let source = datasource(transport);

    let status = source.test_datasource().await;
    assert_eq!(status.status, HealthState::Error);
    assert_eq!(status.message, "GraphQL Error: introspection is disabled");
}

#[tokio::test]
async fn test_health_check_reports_transport_failures() {
    let transport = Arc::new(FakeTransport::failing(|| TransportError::Http {
        status: 502,
        status_text: "Bad Gateway".to_string(),
        body: None,
    }));
    let source = datasource(transport);

    let status = source.test_datasource().await;
    assert_eq!(status.status, HealthState::Error);
    assert_eq!(status.message, "HTTP Response 502: Bad Gateway");
}

#[tokio::test]
async fn test_transport_error_normalization_on_query() {
    let transport = Arc::new(FakeTransport::failing(|| TransportError::Http {
        status: 400,
        status_text: "Bad Request".to_string(),
        body: Some(json!({"data": {"error": {"reason": "no such field"}}})),
    }));
    let source = datasource(transport);

    let request = QueryRequest {
        targets: vec![server_target()],
        range: None,
        scoped_vars: Default::default(),
    };
    match source.query(&request).await {
        Err(ProjectionError::Transport(TransportError::GraphQL { reason, .. })) => {
            assert_eq!(reason, "no such field");
        }
        other => panic!("expected normalized transport error, got {other:?}"),
    }
}
