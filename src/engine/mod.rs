//! Execution engine module
//!
//! Main harvest loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ResourceDescriptor` - what to harvest and how it paginates
//! - `PaginationController` - the per-page request/classify/advance loop,
//!   exposed as a lazy stream of pages or records
//! - `Transport` - the seam to the HTTP layer
//! - `Harvester` - drives a controller into a sink and reports `HarvestStats`

mod controller;
mod harvester;
mod transport;
mod types;

pub use controller::PaginationController;
pub use harvester::Harvester;
pub use transport::Transport;
pub use types::{
    HarvestConfig, HarvestStats, PageOutcome, PaginationSpec, ResourceDescriptor,
};

#[cfg(test)]
mod tests;
