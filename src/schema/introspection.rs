//! Introspection wire types.
//!
//! These mirror the standard GraphQL introspection response shape, limited
//! to what the type registry needs: type kinds, names, and field type
//! references nested through `ofType` wrappers.

use serde::Deserialize;

/// The introspection query sent once per data-source instance.
///
/// `ofType` is expanded seven levels deep, enough for any practical stack
/// of list and non-null wrappers.
pub const INTROSPECTION_QUERY: &str = "\
query IntrospectionQuery {
  __schema {
    queryType { name }
    types {
      kind
      name
      fields(includeDeprecated: true) {
        name
        type {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
                ofType {
                  kind
                  name
                  ofType {
                    kind
                    name
                    ofType {
                      kind
                      name
                      ofType { kind name }
                    }
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}";

/// Kind discriminator shared by introspected types and type references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// Decoded introspection response body (the value under `data`).
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionResponse {
    #[serde(rename = "__schema")]
    pub schema: IntrospectionSchema,
}

/// The `__schema` object.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionSchema {
    #[serde(rename = "queryType")]
    pub query_type: Option<QueryTypeRef>,
    pub types: Vec<IntrospectionType>,
}

/// The `queryType { name }` reference.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryTypeRef {
    pub name: String,
}

/// One entry of `__schema.types`.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionType {
    pub kind: TypeKind,
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<IntrospectionField>>,
}

/// One field of an object or interface type.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: IntrospectionTypeRef,
}

/// A possibly wrapped type reference.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionTypeRef {
    pub kind: TypeKind,
    pub name: Option<String>,
    #[serde(rename = "ofType", default)]
    pub of_type: Option<Box<IntrospectionTypeRef>>,
}
