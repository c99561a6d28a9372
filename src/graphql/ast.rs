//! AST node types for GraphQL executable documents.
//!
//! This covers the subset the projection engine consumes: operations with
//! variable definitions, selection sets of aliased fields with arguments,
//! and (syntactically) fragment spreads and inline fragments, which the
//! resolver ignores the way it ignores any non-field selection.

/// A parsed executable document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// All definitions in the document.
    pub definitions: Vec<Definition>,
}

impl Document {
    /// The first operation definition, the one the engine resolves paths
    /// against.
    pub fn operation(&self) -> Option<&Operation> {
        self.definitions.iter().find_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        })
    }

    /// All fragment definitions.
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition> {
        self.definitions.iter().filter_map(|definition| match definition {
            Definition::Fragment(fragment) => Some(fragment),
            Definition::Operation(_) => None,
        })
    }
}

/// A top-level definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Operation(Operation),
    Fragment(FragmentDefinition),
}

/// The operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

/// An operation definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_type: OperationType,
    /// Operation name, absent for anonymous and shorthand operations.
    pub name: Option<String>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub selection_set: SelectionSet,
}

/// One `$name: Type = default` entry in an operation header.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub var_type: TypeSyntax,
    pub default: Option<ConstValue>,
}

/// Type syntax in a variable definition: `Name`, `[Inner]`, `Inner!`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSyntax {
    Named(String),
    List(Box<TypeSyntax>),
    NonNull(Box<TypeSyntax>),
}

/// A `fragment Name on Type { ... }` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    pub name: String,
    pub type_condition: String,
    pub selection_set: SelectionSet,
}

/// A brace-delimited set of selections.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
}

impl SelectionSet {
    /// The field selections, skipping fragment spreads and inline fragments.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.selections.iter().filter_map(|selection| match selection {
            Selection::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

/// One selection within a selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    FragmentSpread(String),
    InlineFragment(InlineFragment),
}

/// A field selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Response alias, when one was written (`alias: name`).
    pub alias: Option<String>,
    /// The underlying field name as defined in the schema.
    pub name: String,
    pub arguments: Vec<Argument>,
    /// Sub-selections; `None` for scalar selections.
    pub selection_set: Option<SelectionSet>,
}

impl Field {
    /// The name this field appears under in the response: the alias when
    /// present, else the field name.
    pub fn response_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Whether this field selects sub-fields.
    pub fn has_selection_set(&self) -> bool {
        self.selection_set
            .as_ref()
            .is_some_and(|set| !set.is_empty())
    }
}

/// An inline fragment (`... on Type { ... }`).
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub selection_set: SelectionSet,
}

/// One `name: value` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ConstValue,
}

/// A GraphQL input value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<ConstValue>),
    Object(Vec<(String, ConstValue)>),
}
