//! Variable-lookup value derivation.

use serde::Serialize;

use crate::value::{CellValue, FlatRecord};

/// Reserved key naming a lookup entry's display text.
pub const TEXT_KEY: &str = "__text";

/// Reserved key naming a lookup entry's substitution value.
pub const VALUE_KEY: &str = "__value";

/// One variable-lookup entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricValue {
    pub text: String,
    /// Present only for records using the reserved text/value key pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
}

/// Derive lookup values from projected records.
///
/// A record carrying both reserved keys contributes one text/value pair;
/// any other record contributes one text-only entry per field value.
pub fn build_lookup_values(records: &[FlatRecord]) -> Vec<MetricValue> {
    let mut values = Vec::new();
    for record in records {
        match (record.get_wire(TEXT_KEY), record.get_wire(VALUE_KEY)) {
            (Some(text), Some(value)) => values.push(MetricValue {
                text: text.coerce_string(),
                value: Some(value.clone()),
            }),
            _ => {
                for (_, value) in record.iter() {
                    values.push(MetricValue {
                        text: value.coerce_string(),
                        value: None,
                    });
                }
            }
        }
    }
    values
}
