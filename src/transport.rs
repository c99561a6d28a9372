//! Transport collaborator interface.
//!
//! The engine never talks HTTP itself; it hands query text to a [`Transport`]
//! implementation supplied by the host, which POSTs `{"query": <text>}` to
//! the GraphQL endpoint (with whatever auth the host configured) and returns
//! the decoded response envelope. This crate ships only the trait, the
//! envelope types, and the error normalization; concrete transports live
//! host-side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors surfaced by a transport implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP response {status}: {status_text}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// HTTP status text.
        status_text: String,
        /// Decoded response body, when one was readable.
        body: Option<Value>,
    },

    /// A transport failure whose body carried a GraphQL error reason,
    /// re-shaped by [`TransportError::normalize`].
    #[error("GraphQL error: {reason}")]
    GraphQL {
        /// The upstream reason.
        reason: String,
        /// The full upstream error object.
        error: Value,
    },

    /// Any other transport failure (connection refused, TLS, decode).
    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Normalize a transport error whose body matches
    /// `{"data": {"error": {"reason": ...}}}` into a GraphQL-error message;
    /// all other errors pass through unchanged.
    pub fn normalize(self) -> Self {
        let body = match &self {
            Self::Http { body: Some(body), .. } => body,
            _ => return self,
        };
        let error = match body.pointer("/data/error") {
            Some(error) => error,
            None => return self,
        };
        let reason = error
            .pointer("/reason")
            .and_then(Value::as_str)
            .unwrap_or("unknown reason")
            .to_string();
        Self::GraphQL {
            reason,
            error: error.clone(),
        }
    }

    /// A short status description for health-check reporting.
    pub fn status_line(&self) -> String {
        match self {
            Self::Http {
                status,
                status_text,
                ..
            } => format!("HTTP Response {status}: {status_text}"),
            other => other.to_string(),
        }
    }
}

/// One error entry from a GraphQL response's `errors` sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphQLError {
    /// Human-readable error message.
    pub message: String,
    /// Any additional upstream fields (`locations`, `path`, `extensions`).
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rest: serde_json::Map::new(),
        }
    }
}

/// A decoded GraphQL response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    /// The response's data subtree.
    #[serde(default)]
    pub data: Value,
    /// Upstream errors, possibly present alongside data (partial success).
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

impl ResponseEnvelope {
    /// The first upstream error, if any are present.
    pub fn first_error(&self) -> Option<&GraphQLError> {
        self.errors.as_ref().and_then(|errors| errors.first())
    }
}

/// Host-supplied request channel to the GraphQL endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST the given query text and decode the response envelope.
    async fn request(&self, query: &str) -> TransportResult<ResponseEnvelope>;
}
