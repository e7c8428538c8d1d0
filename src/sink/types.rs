//! Sink types and traits

use crate::error::Result;
use crate::types::{lookup_path, JsonValue, WriteMode};
use async_trait::async_trait;

/// Where and how a resource's records are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkTarget {
    /// Resource name (table name)
    pub resource: String,
    /// Write mode declared by the resource
    pub write_mode: WriteMode,
    /// Primary key fields (for merge)
    pub primary_key: Vec<String>,
}

impl SinkTarget {
    /// Create a sink target
    pub fn new(resource: impl Into<String>, write_mode: WriteMode) -> Self {
        Self {
            resource: resource.into(),
            write_mode,
            primary_key: Vec::new(),
        }
    }

    /// Set the primary key
    #[must_use]
    pub fn with_primary_key(mut self, fields: Vec<String>) -> Self {
        self.primary_key = fields;
        self
    }

    /// Merge key of a record: primary key values joined with `|`
    pub fn record_key(&self, record: &JsonValue) -> Option<String> {
        if self.primary_key.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .primary_key
            .iter()
            .map(|field| match lookup_path(record, field) {
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();
        Some(parts.join("|"))
    }
}

/// Consumer of harvested records
#[async_trait]
pub trait RecordSink: Send {
    /// Prepare the destination for `target`
    async fn open(&mut self, target: &SinkTarget) -> Result<()>;

    /// Persist a batch of records
    async fn write(&mut self, records: &[JsonValue]) -> Result<()>;

    /// Flush and return the number of records written
    async fn close(&mut self) -> Result<u64>;
}
