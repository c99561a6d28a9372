//! Error types for response projection.
//!
//! Every fatal condition in the projection pipeline maps to one variant of
//! [`ProjectionError`]. Fatal errors propagate uncaught to the top-level
//! request entry points and fail the whole request for that target; there is
//! no retry anywhere in this crate. Non-fatal conditions (upstream errors
//! alongside found data, unsupported variable kinds) are logged and skipped
//! instead of surfacing here.

use thiserror::Error;

use crate::transport::{GraphQLError, TransportError};

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors that can occur while projecting a response into frames.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// The data path resolved to nothing and the response carried no errors.
    #[error("data path `{path}` did not exist in the response")]
    PathNotFound {
        /// The configured data path.
        path: String,
    },

    /// The data path resolved to nothing and the response carried upstream
    /// errors; wraps the first of them.
    #[error("GraphQL error: {message}")]
    GraphQLResponse {
        /// Message of the first upstream error.
        message: String,
        /// The full first upstream error.
        error: GraphQLError,
    },

    /// A schema path component resolved to a non-object type where an object
    /// type was required.
    #[error("found type `{found}` for component `{component}` of `{path}`, expected object type")]
    TypeMismatch {
        /// The full path being resolved.
        path: String,
        /// The component at which resolution failed.
        component: String,
        /// Name of the type actually found.
        found: String,
    },

    /// A schema object type has no field with the requested name.
    #[error("type `{type_name}` has no field `{field}` (resolving `{path}`)")]
    UnknownField {
        /// The object type that was searched.
        type_name: String,
        /// The missing field name.
        field: String,
        /// The full path being resolved.
        path: String,
    },

    /// A query AST path component named a field absent from the selection
    /// set. A configuration mismatch between data path and query, never a
    /// transient fault.
    #[error("field `{field}` not found in the query selection set (component {index} of `{path}`)")]
    FieldNotFound {
        /// The missing field name.
        field: String,
        /// Zero-based component index within the path.
        index: usize,
        /// The full path being resolved.
        path: String,
    },

    /// Descent was required through a query field that selects no sub-fields.
    #[error("query selects no fields at `{field}` (component {index} of `{path}`)")]
    NoSelectionSet {
        /// The scalar-selected field name.
        field: String,
        /// Zero-based component index within the path.
        index: usize,
        /// The full path being resolved.
        path: String,
    },

    /// The configured data-path string trimmed to nothing.
    #[error("data path is empty")]
    EmptyPath,

    /// Schema introspection produced an unusable type tree.
    #[error("schema introspection failed: {0}")]
    Schema(String),

    /// The query text could not be parsed.
    #[error("query parse failed: {0}")]
    Query(String),

    /// A value could not be parsed as a time instant.
    #[error("could not parse `{value}` as a time instant")]
    Time {
        /// String form of the offending value.
        value: String,
    },

    /// The transport collaborator failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ProjectionError {
    /// Wrap the first upstream GraphQL error for a not-found data path.
    pub fn graphql_response(error: GraphQLError) -> Self {
        Self::GraphQLResponse {
            message: error.message.clone(),
            error,
        }
    }
}
