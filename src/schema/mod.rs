//! Schema introspection and type resolution.
//!
//! [`SchemaClient`] owns the one-time introspection fetch for a data-source
//! instance. The fetch is memoized with an explicit once-cell: callers that
//! arrive while the first fetch is in flight await it rather than issuing
//! their own, and a resolved registry is never invalidated or refetched for
//! the lifetime of the instance.

pub mod introspection;
pub mod resolve;
pub mod types;

use std::sync::Arc;

use tokio::sync::OnceCell;

pub use introspection::{TypeKind, INTROSPECTION_QUERY};
pub use resolve::{is_numeric, type_of_descendant, GENERIC_SCALAR};
pub use types::{NamedType, TypeRef, TypeRegistry};

use crate::error::{ProjectionError, ProjectionResult};
use crate::transport::Transport;

use introspection::IntrospectionResponse;

/// Memoized schema access for one data-source instance.
pub struct SchemaClient {
    transport: Arc<dyn Transport>,
    registry: OnceCell<TypeRegistry>,
}

impl SchemaClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: OnceCell::new(),
        }
    }

    /// The type registry, fetched on first use.
    ///
    /// At most one introspection request is outstanding at a time; a failed
    /// fetch fails every caller awaiting it and leaves the cell unset.
    pub async fn registry(&self) -> ProjectionResult<&TypeRegistry> {
        self.registry
            .get_or_try_init(|| self.fetch())
            .await
    }

    async fn fetch(&self) -> ProjectionResult<TypeRegistry> {
        tracing::debug!("fetching schema introspection");
        let envelope = self.transport.request(INTROSPECTION_QUERY).await?;

        if let Some(error) = envelope.first_error() {
            return Err(ProjectionError::Schema(format!(
                "introspection query failed: {}",
                error.message
            )));
        }

        let response: IntrospectionResponse = serde_json::from_value(envelope.data)
            .map_err(|err| ProjectionError::Schema(format!("malformed introspection response: {err}")))?;
        TypeRegistry::from_introspection(response)
    }
}
