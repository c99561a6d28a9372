//! The schema type tree.
//!
//! [`TypeRegistry`] holds every named type from one introspection fetch,
//! immutable for the lifetime of the fetch. [`TypeRef`] models the list and
//! non-null wrappers around field types; stripping them recovers the named
//! type the way `getNamedType` does in reference GraphQL tooling.

use std::collections::HashMap;

use crate::error::{ProjectionError, ProjectionResult};

use super::introspection::{
    IntrospectionResponse, IntrospectionType, IntrospectionTypeRef, TypeKind,
};

/// A field's type reference, with wrappers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Strip list and non-null wrappers down to the named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }
}

/// One named type from the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    name: String,
    kind: TypeKind,
    fields: HashMap<String, TypeRef>,
}

impl NamedType {
    /// Build an object type from its fields. Primarily for hosts and tests
    /// constructing registries without an endpoint.
    pub fn object(name: impl Into<String>, fields: Vec<(String, TypeRef)>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Object,
            fields: fields.into_iter().collect(),
        }
    }

    /// Build a scalar type.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Scalar,
            fields: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether this is an object type with named sub-fields.
    pub fn is_object(&self) -> bool {
        self.kind == TypeKind::Object
    }

    /// Whether this is a leaf scalar.
    pub fn is_scalar(&self) -> bool {
        self.kind == TypeKind::Scalar
    }

    /// The type reference of a named sub-field.
    pub fn field(&self, name: &str) -> Option<&TypeRef> {
        self.fields.get(name)
    }
}

/// All named types from one schema fetch, plus the root query type name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, NamedType>,
    query_type: Option<String>,
}

impl TypeRegistry {
    /// An empty registry with the given root query type name. Pair with
    /// [`TypeRegistry::insert`] to build registries by hand.
    pub fn new(query_type: impl Into<String>) -> Self {
        Self {
            types: HashMap::new(),
            query_type: Some(query_type.into()),
        }
    }

    /// Register a named type.
    pub fn insert(&mut self, named_type: NamedType) {
        self.types.insert(named_type.name.clone(), named_type);
    }

    /// Look up a named type.
    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    /// The root query object type.
    pub fn query_type(&self) -> ProjectionResult<&NamedType> {
        let name = self
            .query_type
            .as_deref()
            .ok_or_else(|| ProjectionError::Schema("no query type in schema".to_string()))?;
        self.types.get(name).ok_or_else(|| {
            ProjectionError::Schema(format!("query type `{name}` is not defined in the schema"))
        })
    }

    /// Build a registry from a decoded introspection response.
    pub fn from_introspection(response: IntrospectionResponse) -> ProjectionResult<Self> {
        let query_type = response
            .schema
            .query_type
            .map(|query_type| query_type.name);

        let mut types = HashMap::new();
        for entry in response.schema.types {
            let named_type = convert_type(entry)?;
            if let Some(named_type) = named_type {
                types.insert(named_type.name.clone(), named_type);
            }
        }

        Ok(Self { types, query_type })
    }
}

fn convert_type(entry: IntrospectionType) -> ProjectionResult<Option<NamedType>> {
    let name = match entry.name {
        Some(name) => name,
        // Wrapper kinds never appear as named entries; skip defensively
        None => return Ok(None),
    };

    let mut fields = HashMap::new();
    for field in entry.fields.unwrap_or_default() {
        let type_ref = convert_type_ref(&field.type_ref)
            .ok_or_else(|| ProjectionError::Schema(format!(
                "field `{}` of type `{name}` has an unterminated type reference",
                field.name
            )))?;
        fields.insert(field.name, type_ref);
    }

    Ok(Some(NamedType {
        name,
        kind: entry.kind,
        fields,
    }))
}

fn convert_type_ref(type_ref: &IntrospectionTypeRef) -> Option<TypeRef> {
    match type_ref.kind {
        TypeKind::List => {
            let inner = convert_type_ref(type_ref.of_type.as_deref()?)?;
            Some(TypeRef::List(Box::new(inner)))
        }
        TypeKind::NonNull => {
            let inner = convert_type_ref(type_ref.of_type.as_deref()?)?;
            Some(TypeRef::NonNull(Box::new(inner)))
        }
        _ => Some(TypeRef::Named(type_ref.name.clone()?)),
    }
}
