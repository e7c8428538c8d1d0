//! Date window narrowing
//!
//! Narrows the session dimension of a facet space to the sessions that
//! overlap a requested date window.

use super::types::{DateWindow, DimensionKind, FacetDimension, FacetSpace, SessionSpan};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// What the filter did to the space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMatch {
    /// No window bounds, or no session dimension: space returned as-is
    Unfiltered,
    /// Some sessions matched
    Narrowed {
        /// Sessions kept
        kept: usize,
        /// Sessions before filtering
        total: usize,
    },
    /// No session overlapped the window; the full space was returned
    FellBack,
}

/// Narrows session dimensions of a [`FacetSpace`] to a [`DateWindow`].
///
/// A session is kept when its start/end years overlap the window's years
/// (`start_year <= window end year` and `end_year >= window start year`).
/// Missing bounds
/// default to the dimension's natural range. When nothing overlaps, the
/// full, unfiltered space is returned instead of an empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateWindowFilter;

impl DateWindowFilter {
    /// Filter a space, discarding the match report
    pub fn filter(space: &FacetSpace, window: &DateWindow) -> FacetSpace {
        Self::filter_with_match(space, window).0
    }

    /// Filter a space and report what happened
    pub fn filter_with_match(space: &FacetSpace, window: &DateWindow) -> (FacetSpace, WindowMatch) {
        if window.is_unbounded() {
            return (space.clone(), WindowMatch::Unfiltered);
        }

        let mut narrowed = space.clone();
        let mut outcome = WindowMatch::Unfiltered;

        for dimension in space
            .dimensions()
            .iter()
            .filter(|d| d.kind() == DimensionKind::Session)
        {
            match filter_dimension(dimension, window) {
                Some(kept) => {
                    debug!(
                        dimension = dimension.name(),
                        kept = kept.len(),
                        total = dimension.len(),
                        "Narrowed facet dimension to date window"
                    );
                    outcome = match outcome {
                        WindowMatch::FellBack => WindowMatch::FellBack,
                        _ => WindowMatch::Narrowed {
                            kept: kept.len(),
                            total: dimension.len(),
                        },
                    };
                    narrowed = narrowed.with_dimension(kept);
                }
                None => {
                    warn!(
                        dimension = dimension.name(),
                        start = ?window.start,
                        end = ?window.end,
                        "No facet value overlaps the date window, using the full dimension"
                    );
                    outcome = WindowMatch::FellBack;
                }
            }
        }

        if outcome == WindowMatch::FellBack {
            // The whole space falls back, not just the empty dimension
            return (space.clone(), WindowMatch::FellBack);
        }
        (narrowed, outcome)
    }
}

/// Keep the values overlapping the window; None if nothing overlaps
fn filter_dimension(dimension: &FacetDimension, window: &DateWindow) -> Option<FacetDimension> {
    let spans = dimension.spans();
    let (natural_start, natural_end) = natural_range(&spans)?;
    let start = window.start.unwrap_or(natural_start);
    let end = window.end.unwrap_or(natural_end);

    let kept: Vec<usize> = spans
        .iter()
        .filter(|(_, span)| span.overlaps(start, end))
        .map(|(i, _)| *i)
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(dimension.retain_indices(&kept))
    }
}

/// Earliest first day and latest last day over the spans
fn natural_range(spans: &[(usize, SessionSpan)]) -> Option<(NaiveDate, NaiveDate)> {
    let start = spans.iter().map(|(_, s)| s.first_day()).min()?;
    let end = spans.iter().map(|(_, s)| s.last_day()).max()?;
    Some((start, end))
}
