//! Facet module
//!
//! Enumerable parameter dimensions the API recognises (parliamentary
//! sessions, electoral districts) and the date-window narrowing applied to
//! them before a backfill.
//!
//! # Overview
//!
//! - `FacetDimension` - a name plus an ordered, stable value sequence
//! - `FacetSpace` - one or more dimensions enumerated row-major
//! - `FacetCombination` - one value per dimension, i.e. one request
//! - `DateWindowFilter` - narrows session dimensions to a `DateWindow`

mod types;
mod window;

pub use types::{
    Combinations, DateWindow, DimensionKind, FacetCombination, FacetDimension, FacetSpace,
    SessionSpan, SESSION_START_MONTH,
};
pub use window::{DateWindowFilter, WindowMatch};
