//! Data-path resolution against the query AST.
//!
//! The data path was derived from data actually returned by this exact
//! query, so resolution is expected to succeed in normal operation; a
//! failure means the configured path and the query no longer agree, which
//! is a configuration error rather than a transient fault.

use super::ast::{Field, Operation, SelectionSet};
use crate::error::{ProjectionError, ProjectionResult};
use crate::path::DataPath;

/// Find a field in a selection set by its response name (alias when
/// present, else field name). Non-field selections are skipped.
fn field_by_response_name<'a>(set: &'a SelectionSet, name: &str) -> Option<&'a Field> {
    set.fields().find(|field| field.response_name() == name)
}

/// Resolve the query AST node addressed by a dotted data path.
///
/// Walks the operation's selection sets component by component. Fails with
/// [`ProjectionError::FieldNotFound`] when a component names no selection,
/// and with [`ProjectionError::NoSelectionSet`] when descent is required
/// through a scalar selection.
pub fn descendant_field<'a>(
    operation: &'a Operation,
    path: &DataPath,
) -> ProjectionResult<&'a Field> {
    let mut set = &operation.selection_set;
    let components = path.components();

    for (index, component) in components.iter().enumerate() {
        let field = field_by_response_name(set, component.as_str()).ok_or_else(|| {
            ProjectionError::FieldNotFound {
                field: component.as_str().to_string(),
                index,
                path: path.to_string(),
            }
        })?;

        if index + 1 == components.len() {
            return Ok(field);
        }

        set = field
            .selection_set
            .as_ref()
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| ProjectionError::NoSelectionSet {
                field: component.as_str().to_string(),
                index,
                path: path.to_string(),
            })?;
    }

    // Splitting a path always yields at least one component, so the loop
    // above either returned or failed.
    Err(ProjectionError::FieldNotFound {
        field: String::new(),
        index: 0,
        path: path.to_string(),
    })
}

/// Find the aliased selection a response field name refers to, one level
/// deep. Returns `None` for non-aliased names and for leaf fields, which
/// have nothing to alias-resolve.
pub fn alias_for<'a>(field: &'a Field, response_name: &str) -> Option<&'a Field> {
    field
        .selection_set
        .as_ref()?
        .fields()
        .find(|candidate| candidate.alias.as_deref() == Some(response_name))
}
