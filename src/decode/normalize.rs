//! Record normalization
//!
//! Coerces timestamp fields into a form the sink can cast consistently.

use crate::types::JsonValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Rewrites a timestamp field to `YYYY-MM-DD HH:MM:SS`.
///
/// Blank strings become `null`. Values that do not parse (or are not
/// strings) become `null` with the original kept under `<field>_raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampNormalizer {
    field: String,
}

impl TimestampNormalizer {
    /// Normalizer for `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Field this normalizer rewrites
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Normalize one record in place
    pub fn apply(&self, record: &mut JsonValue) {
        let Some(object) = record.as_object_mut() else {
            return;
        };
        let Some(raw) = object.get(&self.field) else {
            return;
        };

        let normalized = match raw {
            JsonValue::Null => return,
            JsonValue::String(s) if s.trim().is_empty() => Ok(JsonValue::Null),
            JsonValue::String(s) => parse_timestamp(s.trim())
                .map(JsonValue::String)
                .ok_or_else(|| raw.clone()),
            other => Err(other.clone()),
        };

        match normalized {
            Ok(value) => {
                object.insert(self.field.clone(), value);
            }
            Err(raw) => {
                tracing::debug!(field = %self.field, value = %raw, "Unparseable timestamp");
                object.insert(format!("{}_raw", self.field), raw);
                object.insert(self.field.clone(), JsonValue::Null);
            }
        }
    }
}

/// Parse an ISO-8601-ish timestamp, accepting a space as date/time separator
pub fn parse_timestamp(value: &str) -> Option<String> {
    let value = value.replacen(' ', "T", 1);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
        return Some(dt.format("%Y-%m-%d %H:%M:%S%:z").to_string());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&value, format) {
            return Some(dt.format("%Y-%m-%d %H:%M:%S").to_string());
        }
    }
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .ok()
        .map(|d| format!("{} 00:00:00", d.format("%Y-%m-%d")))
}
