//! Data-path resolution against the schema type tree.

use crate::error::{ProjectionError, ProjectionResult};
use crate::path::DataPath;

use super::types::{NamedType, TypeRegistry};

/// Name of the schema escape-hatch scalar for opaque JSON substructures.
/// Any descendant of a field with this type is itself untyped.
pub const GENERIC_SCALAR: &str = "GenericScalar";

/// Resolve the named type at a dotted path below `root`.
///
/// Components that parse as integers are list-index placeholders and are
/// skipped; the type tree has no array arity. Resolution short-circuits at
/// the generic scalar and fails with [`ProjectionError::TypeMismatch`] when
/// descent is required through any other non-object type.
pub fn type_of_descendant<'a>(
    registry: &'a TypeRegistry,
    root: &'a NamedType,
    path: &DataPath,
) -> ProjectionResult<&'a NamedType> {
    let mut current = root;
    let components = path.components();

    for (index, component) in components.iter().enumerate() {
        if component.list_index().is_some() {
            // The next real component addresses a field of the current node
            continue;
        }

        let type_ref = current.field(component.as_str()).ok_or_else(|| {
            ProjectionError::UnknownField {
                type_name: current.name().to_string(),
                field: component.as_str().to_string(),
                path: path.to_string(),
            }
        })?;
        let named = registry.get(type_ref.named_type()).ok_or_else(|| {
            ProjectionError::Schema(format!(
                "type `{}` is not defined in the schema",
                type_ref.named_type()
            ))
        })?;

        if index + 1 == components.len() {
            return Ok(named);
        }
        if named.name() == GENERIC_SCALAR {
            // An untyped field has no typed descendants; stop here
            return Ok(named);
        }
        if !named.is_object() {
            return Err(ProjectionError::TypeMismatch {
                path: path.to_string(),
                component: component.as_str().to_string(),
                found: named.name().to_string(),
            });
        }
        current = named;
    }

    Ok(current)
}

/// Whether a type plots as a number: a leaf scalar named exactly `Int` or
/// `Float`.
pub fn is_numeric(named_type: &NamedType) -> bool {
    named_type.is_scalar() && matches!(named_type.name(), "Int" | "Float")
}
