//! YAML Loader module
//!
//! Parse source definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `SourceDefinition` - declarative source: base URL, facets, resources
//! - `ResourceDefinition` / `ModeDefinition` - per-resource, per-mode settings
//! - `RunOptions` - mode, window and reference date for one run
//! - YAML parsing with validation and descriptor construction

mod descriptor;
mod parser;
mod types;

pub use parser::{load_source, load_source_from_str};
pub use types::{
    FacetDefinition, HttpDefinition, ModeDefinition, PaginationDefinition, ResourceDefinition,
    RunOptions, SourceDefinition,
};
