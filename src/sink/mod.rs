//! Sink module
//!
//! Destinations for harvested records.
//!
//! # Overview
//!
//! - `RecordSink` - the trait the harvester writes through
//! - `JsonLinesSink` - one JSON record per line to stdout or a file
//! - `DuckDbSink` - local DuckDB file honouring merge/append/replace

mod database;
mod jsonl;
mod types;

pub use database::{DuckDbSink, DEFAULT_SCHEMA};
pub use jsonl::JsonLinesSink;
pub use types::{RecordSink, SinkTarget};
