//! Host variable enumeration.
//!
//! The host defines dashboard variables of many kinds; this engine supports
//! four of them and resolves the "all values selected" sentinel before
//! handing variables to the template layer. Unsupported kinds are skipped
//! with a warning, never surfaced as errors.

use serde_json::Value;

use crate::template::{ScopedVars, TextValuePair};

/// Variable kinds this engine can substitute.
pub const SUPPORTED_VARIABLE_KINDS: [&str; 4] = ["constant", "custom", "query", "textbox"];

/// The host's "all values selected" sentinel.
pub const ALL_SENTINEL: &str = "$__all";

/// One dashboard variable as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostVariable {
    /// Variable identifier, the substitution key.
    pub id: String,
    /// Host-defined kind string.
    pub kind: String,
    /// The currently selected text and value.
    pub current: TextValuePair,
    /// Explicit replacement for the all-sentinel, when configured.
    pub all_value: Option<String>,
    /// All selectable options; the first entry is the all-placeholder.
    pub options: Vec<TextValuePair>,
}

/// Host-supplied enumeration of currently defined variables.
pub trait VariableSource: Send + Sync {
    fn variables(&self) -> Vec<HostVariable>;
}

/// Resolve host variables into scoped substitution values.
///
/// Unsupported kinds are skipped with a warning. A current value equal to
/// the all-sentinel (bare or as a one-element list) resolves to the explicit
/// all-value when one is configured non-empty, else to every option value
/// except the leading all-placeholder entry.
pub fn resolve_variables(source: &dyn VariableSource) -> ScopedVars {
    let mut vars = ScopedVars::new();
    for variable in source.variables() {
        if !SUPPORTED_VARIABLE_KINDS.contains(&variable.kind.as_str()) {
            tracing::warn!(kind = %variable.kind, id = %variable.id, "variable kind is not supported");
            continue;
        }

        let mut value = variable.current.value.clone();
        if is_all_sentinel(&value) {
            value = match variable.all_value.as_deref() {
                Some(all) if !all.is_empty() => Value::String(all.to_string()),
                _ => Value::Array(
                    variable
                        .options
                        .iter()
                        .skip(1)
                        .map(|option| option.value.clone())
                        .collect(),
                ),
            };
        }

        vars.insert(
            variable.id,
            TextValuePair {
                text: variable.current.text,
                value,
            },
        );
    }
    vars
}

fn is_all_sentinel(value: &Value) -> bool {
    match value {
        Value::String(s) => s == ALL_SENTINEL,
        Value::Array(items) => {
            items.len() == 1 && items[0].as_str() == Some(ALL_SENTINEL)
        }
        _ => false,
    }
}
