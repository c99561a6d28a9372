//! Typed output frames and grouped frame building.
//!
//! Records sharing a group key land in one frame. Frames are created
//! lazily on the first record of their group, in first-seen order; the
//! first record fixes the column set and each column's type and display
//! title, and every later record of the group appends a row.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ProjectionResult;
use crate::graphql::ast::Field;
use crate::graphql::resolve::alias_for;
use crate::path::DataPath;
use crate::schema::resolve::{is_numeric, type_of_descendant};
use crate::schema::types::{NamedType, TypeRegistry};
use crate::template::{render_field_tokens, ScopedVars, TemplateResolver};
use crate::time;
use crate::value::{CellValue, FieldName, FlatRecord};

/// One data path resolved against all three trees at once: the raw
/// response (already projected to records), the schema type tree, and the
/// query AST. Threading this through the pipeline keeps the three walks
/// from diverging.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPath<'a> {
    pub path: &'a DataPath,
    pub schema_type: &'a NamedType,
    pub query_node: &'a Field,
}

/// Column value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Time,
    Number,
    String,
}

/// One named, typed column with its appended values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    name: FieldName,
    #[serde(rename = "type")]
    field_type: FieldType,
    display_name: String,
    values: Vec<CellValue>,
}

impl Column {
    fn new(name: FieldName, field_type: FieldType, display_name: String) -> Self {
        Self {
            name,
            field_type,
            display_name,
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &FieldName {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

/// One output table: ordered typed columns with row values appended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    group_key: String,
    columns: Vec<Column>,
}

impl Frame {
    /// The group key this frame was bucketed under; empty when no group-by
    /// fields are configured.
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by wire-form field name.
    pub fn column(&self, wire: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.wire() == wire)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Append one record as a row. Missing and falsy values are normalized
    /// to the empty string at this read boundary.
    fn append(&mut self, record: &FlatRecord) {
        for column in &mut self.columns {
            let value = record
                .get(&column.name)
                .map(CellValue::normalize_falsy)
                .unwrap_or_else(|| CellValue::String(String::new()));
            column.values.push(value);
        }
    }
}

/// Settings for building one target's frames.
pub struct FrameSettings<'a> {
    /// Name of the time field within records.
    pub time_path: &'a str,
    /// Optional strftime pattern for the time field.
    pub time_format: Option<&'a str>,
    /// Group-by field names (wire form).
    pub group_by: &'a [String],
    /// Optional display-title template.
    pub alias_by: Option<&'a str>,
    /// Variables for external title substitution.
    pub scoped_vars: &'a ScopedVars,
    /// External substitution service for title tokens the closed resolver
    /// leaves behind.
    pub templates: &'a dyn TemplateResolver,
}

/// Group records into frames.
pub fn build_frames(
    records: Vec<FlatRecord>,
    resolved: ResolvedPath<'_>,
    registry: &TypeRegistry,
    settings: &FrameSettings<'_>,
) -> ProjectionResult<Vec<Frame>> {
    let mut frames: IndexMap<String, Frame> = IndexMap::new();

    for mut record in records {
        convert_time_field(&mut record, settings);

        let key = group_key(&record, settings.group_by);
        if !frames.contains_key(&key) {
            let frame = create_frame(&record, &key, resolved, registry, settings)?;
            frames.insert(key.clone(), frame);
        }
        if let Some(frame) = frames.get_mut(&key) {
            frame.append(&record);
        }
    }

    Ok(frames.into_values().collect())
}

/// Parse the configured time field into an instant, in place. A value that
/// does not parse is left untouched and logged.
fn convert_time_field(record: &mut FlatRecord, settings: &FrameSettings<'_>) {
    let Some(value) = record.get_wire(settings.time_path) else {
        return;
    };
    match time::parse_instant(value, settings.time_format) {
        Ok(instant) => record.insert(
            FieldName::from_wire(settings.time_path),
            CellValue::Time(instant),
        ),
        Err(err) => {
            tracing::warn!(field = %settings.time_path, %err, "time field did not parse");
        }
    }
}

/// The group key: group-by field values coerced to strings and joined.
/// Missing fields contribute empty components, never errors.
fn group_key(record: &FlatRecord, group_by: &[String]) -> String {
    let components: Vec<String> = group_by
        .iter()
        .map(|field| {
            record
                .get_wire(field)
                .map(CellValue::coerce_string)
                .unwrap_or_default()
        })
        .collect();
    components.join(",")
}

fn create_frame(
    record: &FlatRecord,
    key: &str,
    resolved: ResolvedPath<'_>,
    registry: &TypeRegistry,
    settings: &FrameSettings<'_>,
) -> ProjectionResult<Frame> {
    let grouped = !settings.group_by.is_empty();
    let mut columns = Vec::with_capacity(record.len());
    for (name, value) in record.iter() {
        let field_type = column_type(name, value, resolved, registry, settings)?;
        let display_name = display_title(name, record, key, grouped, settings);
        columns.push(Column::new(name.clone(), field_type, display_name));
    }
    Ok(Frame {
        group_key: key.to_string(),
        columns,
    })
}

/// Decide a column's type from the first record of its group.
///
/// The configured time field and anything that independently looks like a
/// date-time string plot as time. Ancestor-lifted fields are never checked
/// against the schema; they exist for grouping and stay strings. Everything
/// else follows its schema type, resolved through the field's alias when
/// one was used.
fn column_type(
    name: &FieldName,
    value: &CellValue,
    resolved: ResolvedPath<'_>,
    registry: &TypeRegistry,
    settings: &FrameSettings<'_>,
) -> ProjectionResult<FieldType> {
    if name.wire() == settings.time_path
        || matches!(value, CellValue::Time(_))
        || time::looks_like_datetime(&value.coerce_string())
    {
        return Ok(FieldType::Time);
    }
    if name.is_lifted() {
        return Ok(FieldType::String);
    }

    let unaliased = alias_for(resolved.query_node, name.name())
        .map(|field| field.name.as_str())
        .unwrap_or_else(|| name.name());
    let named = type_of_descendant(registry, resolved.schema_type, &DataPath::parse(unaliased))?;
    if is_numeric(named) {
        Ok(FieldType::Number)
    } else {
        Ok(FieldType::String)
    }
}

/// The column's display title.
///
/// Without a template: the group key joined onto the field name when
/// grouping, else just the field name. With a template: record-field tokens
/// substituted by the closed resolver, then the external resolver for
/// whatever remains.
fn display_title(
    name: &FieldName,
    record: &FlatRecord,
    key: &str,
    grouped: bool,
    settings: &FrameSettings<'_>,
) -> String {
    match settings.alias_by {
        None => {
            if grouped {
                format!("{key}_{}", name.wire())
            } else {
                name.wire()
            }
        }
        Some(template) => {
            let rendered = render_field_tokens(template, record, Some(&name.wire()));
            settings.templates.replace(&rendered, settings.scoped_vars)
        }
    }
}
