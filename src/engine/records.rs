//! Record projection out of raw responses.
//!
//! Walks a dotted data path through the response's `data` subtree. Arrays
//! along the way fan the walk out over their elements; when the addressed
//! field of an element is itself an array, every item of that array becomes
//! its own record and the element's sibling fields are lifted onto it under
//! the reserved `..` prefix so records can still be grouped by them.

use serde_json::{Map, Value};

use crate::error::{ProjectionError, ProjectionResult};
use crate::path::{DataPath, PathComponent};
use crate::transport::ResponseEnvelope;
use crate::value::{FlatRecord, LIFTED_PREFIX};

/// Project the flat records addressed by `path` out of a response.
///
/// A found-but-empty list yields zero records without error. A path that
/// resolves to nothing fails with the first upstream error when the
/// response carries errors, else with [`ProjectionError::PathNotFound`].
/// Upstream errors alongside found data are logged and do not fail the
/// projection.
pub fn project_records(
    envelope: &ResponseEnvelope,
    path: &DataPath,
) -> ProjectionResult<Vec<FlatRecord>> {
    let mut current = envelope.data.clone();
    for component in path.components() {
        current = step(current, component);
    }

    if is_absent(&current) {
        if let Some(error) = envelope.first_error() {
            return Err(ProjectionError::graphql_response(error.clone()));
        }
        return Err(ProjectionError::PathNotFound {
            path: path.to_string(),
        });
    }

    if let Some(errors) = &envelope.errors {
        if !errors.is_empty() {
            // Partial success: data was found, report the errors and go on
            tracing::warn!(
                path = %path,
                count = errors.len(),
                first = %errors[0].message,
                "response carried errors alongside data"
            );
        }
    }

    let elements = match current {
        Value::Array(items) => items,
        single => vec![single],
    };
    Ok(elements.iter().map(FlatRecord::from_value).collect())
}

/// Apply one path component to the accumulator.
fn step(current: Value, component: &PathComponent) -> Value {
    match current {
        Value::Array(items) => {
            let mut docs = Vec::with_capacity(items.len());
            for item in items {
                project_element(item, component, &mut docs);
            }
            Value::Array(docs)
        }
        Value::Object(mut object) => object
            .shift_remove(component.as_str())
            .unwrap_or(Value::Null),
        // Null (and any other leaf) short-circuits the rest of the walk
        _ => Value::Null,
    }
}

/// Project `component` out of one array element.
fn project_element(item: Value, component: &PathComponent, docs: &mut Vec<Value>) {
    match item {
        // shift_remove keeps the remaining siblings in document order
        Value::Object(mut object) => match object.shift_remove(component.as_str()) {
            Some(Value::Array(children)) => {
                for child in children {
                    docs.push(lift_siblings(child, &object));
                }
            }
            Some(value) => docs.push(value),
            None => docs.push(Value::Null),
        },
        Value::Array(inner) => {
            // A list element indexed by a numeric component
            let child = component
                .list_index()
                .and_then(|index| inner.into_iter().nth(index));
            docs.push(child.unwrap_or(Value::Null));
        }
        _ => docs.push(Value::Null),
    }
}

/// Copy every remaining sibling field of the enclosing element onto a child
/// record under the `..` prefix. Non-object children carry nothing.
fn lift_siblings(child: Value, siblings: &Map<String, Value>) -> Value {
    match child {
        Value::Object(mut object) => {
            for (name, value) in siblings {
                object.insert(format!("{LIFTED_PREFIX}{name}"), value.clone());
            }
            Value::Object(object)
        }
        other => other,
    }
}

/// Host-style absence: null, false, zero, and the empty string all read as
/// "the path resolved to nothing". Empty arrays and objects do not; they
/// are found-but-empty results.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
