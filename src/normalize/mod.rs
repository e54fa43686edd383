//! Record normalization
//!
//! Reduces heterogeneous exported chat records to the canonical [`Message`]
//! view. Every field has a fallback, so no record is ever rejected for a
//! missing field; only a non-sequence collection is an error.

mod source;

pub use source::{load_sources, parse_export, LoadedSources};

use crate::error::{PulseError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Author used when no author field resolves
pub const UNKNOWN_AUTHOR: &str = "Unknown";
/// Channel used when neither the record nor its source names one
pub const DEFAULT_CHANNEL: &str = "general";

/// Field carrying the per-record source tag attached at load time
pub const SOURCE_TAG_FIELD: &str = "_ch";

/// Canonical message view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub author: String,
    /// Lower-cased channel name used for all matching
    pub channel: String,
    /// Channel name as it appeared in the record, for display
    pub channel_label: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub text: String,
    /// Lower-cased role names
    pub roles: BTreeSet<String>,
    /// Originating source tag (file stem, channel export name)
    pub source: Option<String>,
}

impl Message {
    /// Text lower-cased for case-insensitive matching
    pub fn lowered_text(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Normalize one record; `source` is the tag of the export it came from
pub fn normalize_record(record: &Value, source: Option<&str>) -> Message {
    let author_obj = record.get("author");

    let author = author_obj
        .and_then(|a| {
            str_field(a, "username")
                .or_else(|| str_field(a, "name"))
                .or_else(|| str_field(a, "global_name"))
                .or_else(|| str_field(a, "display_name"))
        })
        .or_else(|| str_field(record, "username"))
        .or_else(|| str_field(record, "user"))
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string();

    let channel_label = str_field(record, SOURCE_TAG_FIELD)
        .or_else(|| str_field(record, "channel"))
        .map(str::to_string)
        .or_else(|| scalar_field(record, "channel_id"))
        .or_else(|| source.filter(|s| !s.is_empty()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_CHANNEL.to_string());

    let timestamp = record
        .get("timestamp")
        .filter(|v| !v.is_null())
        .or_else(|| record.get("date"))
        .and_then(parse_timestamp);

    let text = str_field(record, "content")
        .or_else(|| str_field(record, "text"))
        .unwrap_or_default()
        .to_string();

    let roles = author_obj
        .and_then(|a| a.get("roles"))
        .or_else(|| record.get("roles"))
        .map(parse_roles)
        .unwrap_or_default();

    Message {
        author,
        channel: channel_label.to_lowercase(),
        channel_label,
        timestamp,
        text,
        roles,
        source: source.map(str::to_string),
    }
}

/// Normalize a whole record collection
///
/// Fails with `InvalidInput` if `records` is not an array. An empty array is
/// returned as an empty vector; callers decide whether that is an error.
pub fn normalize_all(records: &Value, source: Option<&str>) -> Result<Vec<Message>> {
    let items = records.as_array().ok_or_else(|| {
        PulseError::InvalidInput(format!(
            "expected a sequence of records, got {}",
            value_kind(records)
        ))
    })?;

    Ok(items
        .iter()
        .map(|record| normalize_record(record, source))
        .collect())
}

/// Parse a timestamp value: RFC 3339, naive ISO date-time (UTC), plain date,
/// or epoch milliseconds. Returns `None` for anything unparseable.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    // Numeric strings are epoch milliseconds
    s.parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

fn parse_roles(value: &Value) -> BTreeSet<String> {
    let Some(items) = value.as_array() else {
        return BTreeSet::new();
    };

    items
        .iter()
        .filter_map(|role| match role {
            Value::String(name) => Some(name.as_str()),
            Value::Object(_) => str_field(role, "name"),
            _ => None,
        })
        .map(str::to_lowercase)
        .collect()
}

/// Non-empty string field
fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// String or numeric field rendered as a string (snowflake ids are often numbers)
fn scalar_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
