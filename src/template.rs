//! Template substitution.
//!
//! Two layers cooperate here. The closed resolver in this module recognizes
//! exactly the record-derived token kinds — `$field_<name>` for every field
//! of the current record and `$fieldName` for the field a title is being
//! computed for — and substitutes them literally. Anything else (host user
//! variables, `$timeFrom`, `$timeTo`) is left intact and deferred to the
//! external [`TemplateResolver`] collaborator.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::FlatRecord;

/// A variable's display text and substitution value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextValuePair {
    pub text: String,
    pub value: Value,
}

impl TextValuePair {
    pub fn new(text: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// Variables in scope for one request, keyed by variable name.
pub type ScopedVars = HashMap<String, TextValuePair>;

/// Host-supplied variable substitution service.
///
/// Used to substitute request-time variables into query text before sending,
/// and to post-process computed alias titles for any tokens the closed
/// resolver did not recognize.
pub trait TemplateResolver: Send + Sync {
    fn replace(&self, template: &str, vars: &ScopedVars) -> String;
}

/// A resolver that performs no substitution. The default for hosts without
/// a template service, and handy in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl TemplateResolver for NoopResolver {
    fn replace(&self, template: &str, _vars: &ScopedVars) -> String {
        template.to_string()
    }
}

/// `$fieldName`, or `$field_<wire name>` where wire names may be dotted and
/// may carry the `..` lift prefix.
static FIELD_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(fieldName\b|field_[A-Za-z0-9_.]+)").expect("field token regex is valid")
});

/// Substitute record-field tokens into a template.
///
/// `current_field` binds the `$fieldName` token; it is unbound (left intact)
/// in contexts with no current field, such as annotation templates. A
/// `$field_<name>` token whose captured name over-matches trailing text is
/// retried with trailing dot-segments trimmed off; tokens naming no record
/// field at all are left for the external resolver.
pub fn render_field_tokens(
    template: &str,
    record: &FlatRecord,
    current_field: Option<&str>,
) -> String {
    FIELD_TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            let token = &caps[1];
            if token == "fieldName" {
                return match current_field {
                    Some(name) => name.to_string(),
                    None => caps[0].to_string(),
                };
            }
            let name = &token["field_".len()..];
            match lookup_trimming(record, name) {
                Some((value, rest)) => format!("{value}{rest}"),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Look up a wire name in the record, trimming trailing `.segment` chunks
/// from the captured token until a field matches. Returns the coerced value
/// and whatever suffix was trimmed.
fn lookup_trimming<'a>(record: &FlatRecord, name: &'a str) -> Option<(String, &'a str)> {
    let mut end = name.len();
    loop {
        let candidate = &name[..end];
        if let Some(value) = record.get_wire(candidate) {
            return Some((value.coerce_string(), &name[end..]));
        }
        end = candidate.rfind('.')?;
    }
}
