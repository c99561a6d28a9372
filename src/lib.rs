//! # frameql
//!
//! Projects nested GraphQL query responses into grouped, typed data frames
//! for visualization, plus annotation events and variable-lookup values
//! derived from the same responses.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Raw GraphQL Response                     │
//! │        (nested object/array graph + errors)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [engine::records]
//! ┌─────────────────────────────────────────────────────────┐
//! │       FlatRecords (dotted keys, ancestor lifts)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!          schema walk ────┼──── query AST walk
//!       [schema::resolve]  │   [graphql::resolve]
//!                          ▼ [engine::frames]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Frames (grouped, typed columns, display titles)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The same dotted data path is walked through three trees in lock-step:
//! the raw response (to project records), the schema type tree (to type
//! columns), and the parsed query AST (to see through field aliases).
//! [`engine::GraphQLDataSource`] orchestrates the walks per target and per
//! path, fanning all network requests out concurrently and joining them
//! before the purely synchronous projection runs.
//!
//! Transport, template substitution, and variable enumeration are host
//! concerns, abstracted as the [`transport::Transport`],
//! [`template::TemplateResolver`], and [`variables::VariableSource`]
//! traits.

pub mod config;
pub mod engine;
pub mod error;
pub mod graphql;
pub mod path;
pub mod schema;
pub mod template;
pub mod time;
pub mod transport;
pub mod value;
pub mod variables;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{AnnotationQuery, TargetQuery, VariableQuery};
    pub use crate::engine::{
        AnnotationEvent, AnnotationRequest, Column, FieldType, Frame, GraphQLDataSource,
        HealthState, HealthStatus, MetricValue, QueryRequest, TimeRange,
    };
    pub use crate::error::{ProjectionError, ProjectionResult};
    pub use crate::path::DataPath;
    pub use crate::template::{NoopResolver, ScopedVars, TemplateResolver, TextValuePair};
    pub use crate::transport::{GraphQLError, ResponseEnvelope, Transport, TransportError};
    pub use crate::value::{CellValue, FieldName, FlatRecord};
    pub use crate::variables::{HostVariable, VariableSource};
}

pub use engine::GraphQLDataSource;
pub use error::{ProjectionError, ProjectionResult};
