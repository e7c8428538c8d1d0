//! # Riksdagen Harvest
//!
//! A resumable, faceted pagination engine for the Riksdagen open data API.
//!
//! The API caps page sizes and offers no native paging on several of its
//! list endpoints. Complete harvests therefore split the record space along
//! enumerable dimensions (parliamentary sessions, electoral districts) or walk
//! a date cursor forward, one bounded request at a time.
//!
//! ## Features
//!
//! - **Facet Pagination**: one or two dimensions, narrowed to a date window
//! - **Latest-Facet Incremental**: derive the current session from a date
//! - **Date Cursor**: advance a request parameter through a record field
//! - **Incremental Dedup**: skip records older than the cursor seed
//! - **Sinks**: JSON lines or a local DuckDB file honouring the write mode
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use riksdagen_harvest::engine::{Harvester, PaginationController};
//! use riksdagen_harvest::http::HttpClient;
//! use riksdagen_harvest::loader::{load_source, RunOptions};
//! use riksdagen_harvest::sink::DuckDbSink;
//!
//! #[tokio::main]
//! async fn main() -> riksdagen_harvest::Result<()> {
//!     let source = load_source("riksdagen")?;
//!     let descriptor = source.descriptor("voteringlista", &RunOptions::incremental())?;
//!     let client = HttpClient::with_config(source.http_config())?;
//!     let controller = PaginationController::new(descriptor, client)?;
//!
//!     let mut sink = DuckDbSink::for_database("riksdagen");
//!     let stats = Harvester::new(controller).run(&mut sink).await?;
//!     println!("{} records in {} pages", stats.records, stats.pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  loader: YAML source → ResourceDescriptor (per mode, per run)   │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┴─────────────────────────────────┐
//! │  engine: PaginationController → Stream<PageOutcome> → Harvester │
//! └──────┬────────────┬──────────────┬──────────────┬───────────────┘
//!        │            │              │              │
//! ┌──────┴─────┬──────┴──────┬───────┴──────┬───────┴─────┐
//! │ pagination │   request   │    decode    │    sink     │
//! ├────────────┼─────────────┼──────────────┼─────────────┤
//! │ Facets     │ Structured  │ Selector     │ JSON lines  │
//! │ LatestFacet│ Raw URL     │ Full pages   │ DuckDB      │
//! │ DateCursor │ Injection   │ Malformed    │             │
//! │ NextUrl    │             │ Timestamps   │             │
//! └────────────┴─────────────┴──────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the harvester
pub mod error;

/// Common types and type aliases
pub mod types;

/// Facet dimensions, spaces and date windows
pub mod facet;

/// Pagination state and incremental cursors
pub mod state;

/// Request targets and parameter injection
pub mod request;

/// Response classification and record normalisation
pub mod decode;

/// Pagination strategies
pub mod pagination;

/// Pagination controller and harvester
pub mod engine;

/// HTTP client with retry and rate limiting
pub mod http;

/// Template interpolation
pub mod template;

/// YAML loader for source definitions
pub mod loader;

/// Built-in source definitions
pub mod sources;

/// Record destinations
pub mod sink;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use loader::{load_source, load_source_from_str, RunOptions, SourceDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
