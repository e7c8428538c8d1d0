//! CLI module
//!
//! Command-line interface for harvesting resources.
//!
//! # Commands
//!
//! - `run` - Harvest one resource into DuckDB or JSON lines
//! - `resources` - List resources and their strategies
//! - `facets` - Print the facet combinations a run would visit
//! - `validate` - Validate a source definition

mod commands;
mod runner;

pub use commands::{Cli, Commands, DateArgs, OutputFormat};
pub use runner::Runner;
