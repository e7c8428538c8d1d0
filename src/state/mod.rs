//! State module
//!
//! In-memory progress tracking for one harvest run.
//!
//! # Overview
//!
//! The state module provides:
//! - `PaginationState` - immutable traversal state threaded through each step
//! - `CursorTracker` - incremental dedup cursor (monotonic within a run)
//!
//! State is discarded when the run ends. Resuming an incremental sync relies
//! on the destination's bookkeeping, which can seed a tracker through
//! [`CursorTracker::resume_from`].

mod cursor;
mod types;

pub use cursor::{CursorCheck, CursorTracker, CursorValue, IncrementalCursor};
pub use types::{PaginationState, Phase};

#[cfg(test)]
mod tests;
