//! Time instant parsing and detection.
//!
//! Time fields arrive as RFC 3339 strings, formatted strings with a
//! configured strftime pattern, or epoch-millisecond numbers. Unconfigured
//! fields are independently time-typed when their value looks like a
//! standard date-time string.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ProjectionError, ProjectionResult};
use crate::value::CellValue;

/// RFC 3339 / ISO 8601 date-time shape, time part required.
static DATETIME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[Tt ]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:?\d{2})?$")
        .expect("datetime shape regex is valid")
});

/// Whether a string looks like a standard date-time value.
pub fn looks_like_datetime(s: &str) -> bool {
    DATETIME_SHAPE.is_match(s)
}

/// Parse a cell value into an instant.
///
/// With an explicit format, the value is parsed with that strftime pattern
/// (zone-less results are taken as UTC). Without one, RFC 3339 is tried
/// first, then bare `YYYY-MM-DD[ HH:MM:SS]`, then integer epoch
/// milliseconds.
pub fn parse_instant(value: &CellValue, format: Option<&str>) -> ProjectionResult<DateTime<FixedOffset>> {
    match value {
        CellValue::Time(t) => Ok(*t),
        CellValue::Integer(ms) => epoch_millis(*ms),
        CellValue::Float(ms) => epoch_millis(*ms as i64),
        CellValue::String(s) => match format {
            Some(fmt) if !fmt.is_empty() => parse_formatted(s, fmt),
            _ => parse_unformatted(s),
        },
        other => Err(ProjectionError::Time {
            value: other.coerce_string(),
        }),
    }
}

fn epoch_millis(ms: i64) -> ProjectionResult<DateTime<FixedOffset>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.fixed_offset())
        .ok_or(ProjectionError::Time {
            value: ms.to_string(),
        })
}

fn parse_formatted(s: &str, fmt: &str) -> ProjectionResult<DateTime<FixedOffset>> {
    if let Ok(t) = DateTime::parse_from_str(s, fmt) {
        return Ok(t);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
        return Ok(naive.and_utc().fixed_offset());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
        return Ok(date
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
            .fixed_offset());
    }
    Err(ProjectionError::Time {
        value: s.to_string(),
    })
}

fn parse_unformatted(s: &str) -> ProjectionResult<DateTime<FixedOffset>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
            .fixed_offset());
    }
    if let Ok(ms) = s.parse::<i64>() {
        return epoch_millis(ms);
    }
    Err(ProjectionError::Time {
        value: s.to_string(),
    })
}
