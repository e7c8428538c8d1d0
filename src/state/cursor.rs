//! Incremental cursor tracking
//!
//! Extracts a dedup/ordering value from each record, filters records older
//! than the run's seed and remembers the highest value seen.

use crate::types::{lookup_path, JsonValue};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Field path plus the seed used when no prior state exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalCursor {
    /// Dot-separated path into each record
    pub path: String,
    /// Seed value
    pub initial_value: String,
}

impl IncrementalCursor {
    /// Create a cursor definition
    pub fn new(path: impl Into<String>, initial_value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            initial_value: initial_value.into(),
        }
    }
}

/// A comparable cursor value.
///
/// Two integers compare numerically; anything else compares as text, which
/// orders ISO dates and timestamps correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorValue {
    /// Integral key such as a sequence number
    Integer(i64),
    /// Anything else
    Text(String),
}

impl CursorValue {
    /// Parse a raw string
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        raw.parse::<i64>()
            .map_or_else(|_| Self::Text(raw.to_string()), Self::Integer)
    }

    /// Read a cursor value out of a JSON scalar
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(s) if !s.trim().is_empty() => Some(Self::parse(s)),
            JsonValue::Number(n) => Some(
                n.as_i64()
                    .map_or_else(|| Self::Text(n.to_string()), Self::Integer),
            ),
            _ => None,
        }
    }

    /// Compare two cursor values
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for CursorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Outcome of checking one record against the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorCheck {
    /// At or after the seed; emit
    Fresh,
    /// Strictly before the seed; already harvested by an earlier run
    Seen,
    /// No usable cursor value; emit, but it does not move the cursor
    Unreadable,
}

impl CursorCheck {
    /// Whether the record should be handed to the sink
    pub fn should_emit(self) -> bool {
        !matches!(self, Self::Seen)
    }
}

/// Holds the current value of an incremental cursor during one run.
///
/// The current value only moves forward and is never reset mid-run.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    path: String,
    start: CursorValue,
    current: CursorValue,
    unreadable: u64,
    seen: u64,
}

impl CursorTracker {
    /// Start from the definition's seed value
    pub fn new(cursor: &IncrementalCursor) -> Self {
        Self::resume_from(cursor, None)
    }

    /// Start from a value recorded by a previous run, falling back to the seed
    pub fn resume_from(cursor: &IncrementalCursor, last_value: Option<&str>) -> Self {
        let start = CursorValue::parse(last_value.unwrap_or(&cursor.initial_value));
        Self {
            path: cursor.path.clone(),
            current: start.clone(),
            start,
            unreadable: 0,
            seen: 0,
        }
    }

    /// Field path the value is read from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value the run started from
    pub fn start_value(&self) -> &CursorValue {
        &self.start
    }

    /// Highest value seen so far (or the start value)
    pub fn current_value(&self) -> &CursorValue {
        &self.current
    }

    /// Records that carried no usable cursor value
    pub fn unreadable_count(&self) -> u64 {
        self.unreadable
    }

    /// Records filtered as already harvested
    pub fn seen_count(&self) -> u64 {
        self.seen
    }

    /// Check a record and advance the cursor if it carries a newer value
    pub fn observe(&mut self, record: &JsonValue) -> CursorCheck {
        let Some(value) = lookup_path(record, &self.path).and_then(CursorValue::from_json) else {
            self.unreadable += 1;
            return CursorCheck::Unreadable;
        };

        if value.compare(&self.start) == Ordering::Less {
            self.seen += 1;
            return CursorCheck::Seen;
        }

        if value.compare(&self.current) == Ordering::Greater {
            self.current = value;
        }
        CursorCheck::Fresh
    }
}
