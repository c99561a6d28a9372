//! Per-target configuration.
//!
//! These structs mirror the host's query-editor fields, camelCase on the
//! wire. Comma-separated list fields (`dataPath`, `groupBy`, annotation
//! tags) stay raw strings here and are split at use sites.

use serde::{Deserialize, Serialize};

/// Default query text for a fresh target.
pub const DEFAULT_QUERY_TEXT: &str = "query {\n}";

/// Default time-field name.
pub const DEFAULT_TIME_PATH: &str = "Time";

/// Configuration of one query target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetQuery {
    /// The GraphQL query text, possibly containing host `${...}` tokens.
    pub query_text: String,
    /// Comma-separated list of dotted data paths.
    pub data_path: String,
    /// Name of the time field within projected records.
    pub time_path: String,
    /// Optional strftime pattern for parsing the time field; empty means
    /// auto-detection.
    pub time_format: String,
    /// Comma-separated list of group-by field names.
    pub group_by: String,
    /// Optional display-title template; empty disables templating.
    pub alias_by: String,
}

impl Default for TargetQuery {
    fn default() -> Self {
        Self {
            query_text: DEFAULT_QUERY_TEXT.to_string(),
            data_path: String::new(),
            time_path: DEFAULT_TIME_PATH.to_string(),
            time_format: String::new(),
            group_by: String::new(),
            alias_by: String::new(),
        }
    }
}

impl TargetQuery {
    /// The configured time format, or `None` when empty.
    pub fn time_format(&self) -> Option<&str> {
        if self.time_format.is_empty() {
            None
        } else {
            Some(self.time_format.as_str())
        }
    }

    /// The alias template, or `None` when empty.
    pub fn alias_by(&self) -> Option<&str> {
        if self.alias_by.is_empty() {
            None
        } else {
            Some(self.alias_by.as_str())
        }
    }
}

/// Configuration of an annotation query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotationQuery {
    /// The underlying query target.
    #[serde(flatten)]
    pub target: TargetQuery,
    /// Field holding the region end instant; empty for point annotations.
    pub end_time_path: String,
    /// Title template (`$field_<name>` tokens).
    pub annotation_title: String,
    /// Body-text template.
    pub annotation_text: String,
    /// Comma-separated tags template.
    pub annotation_tags: String,
}

/// Configuration of a variable-lookup query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableQuery {
    /// The GraphQL query text.
    pub query_text: String,
    /// A single dotted data path (no comma list here).
    pub data_path: String,
}

impl Default for VariableQuery {
    fn default() -> Self {
        Self {
            query_text: DEFAULT_QUERY_TEXT.to_string(),
            data_path: String::new(),
        }
    }
}
