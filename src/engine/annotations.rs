//! Annotation event derivation.
//!
//! Annotations reuse the record projection and skip the schema and query
//! walks entirely: every projected record becomes one event, with instants
//! pulled from two configured fields and titles, text, and tags rendered
//! through the record-field token resolver.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::config::AnnotationQuery;
use crate::path::split_list;
use crate::template::render_field_tokens;
use crate::time;
use crate::value::FlatRecord;

/// One derived annotation event.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationEvent {
    /// Event instant, when the time field was present and parsed.
    pub time: Option<DateTime<FixedOffset>>,
    /// Region end instant, when the end-time field was present and parsed.
    pub time_end: Option<DateTime<FixedOffset>>,
    /// Whether the event spans a region.
    pub is_region: bool,
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
}

/// Derive one annotation event per projected record.
pub fn build_annotations(records: &[FlatRecord], query: &AnnotationQuery) -> Vec<AnnotationEvent> {
    records
        .iter()
        .map(|record| annotation_for(record, query))
        .collect()
}

fn annotation_for(record: &FlatRecord, query: &AnnotationQuery) -> AnnotationEvent {
    let format = query.target.time_format();
    let time = instant_at(record, &query.target.time_path, format);
    let time_end = instant_at(record, &query.end_time_path, format);

    let title = render_field_tokens(&query.annotation_title, record, None);
    let text = render_field_tokens(&query.annotation_text, record, None);
    let tags = render_field_tokens(&query.annotation_tags, record, None);

    AnnotationEvent {
        time,
        is_region: time_end.is_some(),
        time_end,
        title,
        text,
        tags: split_list(&tags),
    }
}

fn instant_at(
    record: &FlatRecord,
    field: &str,
    format: Option<&str>,
) -> Option<DateTime<FixedOffset>> {
    if field.is_empty() {
        return None;
    }
    let value = record.get_wire(field)?;
    match time::parse_instant(value, format) {
        Ok(instant) => Some(instant),
        Err(err) => {
            tracing::warn!(%field, %err, "annotation time field did not parse");
            None
        }
    }
}
