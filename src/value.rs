//! Flat records and cell values.
//!
//! The projection pipeline reduces nested response subtrees to flat records:
//! insertion-ordered maps from field name to a leaf value. Nested structure
//! is flattened into dotted keys (`server.load.avg`); values lifted from an
//! enclosing array element are tagged as ancestor fields and carry the
//! reserved `..` prefix in their wire form (`..host`).

use std::fmt;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

/// Reserved wire prefix marking a value lifted from an ancestor array element.
pub const LIFTED_PREFIX: &str = "..";

// ============================================================================
// Field names
// ============================================================================

/// A flat-record field name with an explicit ancestor-lift tag.
///
/// The lift tag is carried structurally rather than as a string prefix; the
/// `..` convention is applied only when converting to and from wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldName {
    name: String,
    lifted: bool,
}

impl FieldName {
    /// A field belonging to the record's own leaf object.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lifted: false,
        }
    }

    /// A field lifted from an enclosing array element.
    pub fn lifted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lifted: true,
        }
    }

    /// Parse a wire-form name, honoring the reserved `..` prefix.
    pub fn from_wire(wire: &str) -> Self {
        match wire.strip_prefix(LIFTED_PREFIX) {
            Some(rest) => Self::lifted(rest),
            None => Self::leaf(wire),
        }
    }

    /// The bare field name, without the lift prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this field was lifted from an ancestor array element.
    pub fn is_lifted(&self) -> bool {
        self.lifted
    }

    /// The wire form, with the `..` prefix re-applied for lifted fields.
    pub fn wire(&self) -> String {
        if self.lifted {
            format!("{LIFTED_PREFIX}{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lifted {
            f.write_str(LIFTED_PREFIX)?;
        }
        f.write_str(&self.name)
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // The `..` convention is the wire form of the lift tag
        serializer.serialize_str(&self.wire())
    }
}

// ============================================================================
// Cell values
// ============================================================================

/// A leaf value in a flat record or frame cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// A parsed time instant. Only produced by the engine's time-field
    /// conversion, never directly by flattening.
    Time(DateTime<FixedOffset>),
}

impl CellValue {
    /// Convert a JSON leaf into a cell value. Composite values are not
    /// expected here; they are decomposed by flattening first.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s.clone()),
            composite => Self::String(composite.to_string()),
        }
    }

    /// Coerce to a display string, the way group keys and template
    /// substitutions render values. Null renders empty.
    pub fn coerce_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Time(t) => t.to_rfc3339(),
        }
    }

    /// Host-style falsiness: null, false, zero, and the empty string.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Integer(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::String(s) => s.is_empty(),
            Self::Time(_) => false,
        }
    }

    /// The read-time row normalizer: falsy cells become the empty string.
    pub fn normalize_falsy(&self) -> Self {
        if self.is_falsy() {
            Self::String(String::new())
        } else {
            self.clone()
        }
    }

    /// The parsed instant, if this cell holds one.
    pub fn as_time(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coerce_string())
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Time(t) => serializer.serialize_str(&t.to_rfc3339()),
        }
    }
}

// ============================================================================
// Flat records
// ============================================================================

/// A single flattened record: field name to leaf value, insertion-ordered.
///
/// Column order in the output frames follows record field order, so ordering
/// is part of the contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: IndexMap<FieldName, CellValue>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-flatten a JSON value into a single-level record.
    ///
    /// Nested objects and arrays contribute dotted keys (`a.b`, `items.0`);
    /// a bare leaf at the root lands under the empty key. Keys already
    /// carrying the `..` wire prefix stay tagged as lifted.
    pub fn from_value(value: &Value) -> Self {
        let mut record = Self::new();
        flatten_into(&mut record, String::new(), value);
        record
    }

    pub fn insert(&mut self, name: FieldName, value: CellValue) {
        self.fields.insert(name, value);
    }

    pub fn get(&self, name: &FieldName) -> Option<&CellValue> {
        self.fields.get(name)
    }

    /// Look up a field by its wire-form name (`..`-prefixed for lifted).
    pub fn get_wire(&self, wire: &str) -> Option<&CellValue> {
        self.fields.get(&FieldName::from_wire(wire))
    }

    pub fn contains_wire(&self, wire: &str) -> bool {
        self.get_wire(wire).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &CellValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(FieldName, CellValue)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (FieldName, CellValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

fn flatten_into(record: &mut FlatRecord, prefix: String, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(record, join_key(&prefix, key), child);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(record, join_key(&prefix, &index.to_string()), child);
            }
        }
        // Empty composites flatten away entirely.
        Value::Object(_) | Value::Array(_) => {}
        leaf => record.insert(FieldName::from_wire(&prefix), CellValue::from_json(leaf)),
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
