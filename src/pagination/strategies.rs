//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{Advance, PageRequest, Paginator, StopReason};
use crate::decode::ClassifiedPage;
use crate::error::{Error, Result};
use crate::facet::{FacetDimension, FacetSpace, SessionSpan};
use crate::state::PaginationState;
use crate::types::{lookup_path, JsonValue, StringMap};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

// ============================================================================
// Facet Pagination
// ============================================================================

/// One request per facet combination.
///
/// With one dimension this walks the values in order; with two it cycles
/// the inner dimension completely for every outer value. Empty pages do not
/// stop the walk, since each combination is an independent slice.
#[derive(Debug, Clone)]
pub struct FacetPaginator {
    space: FacetSpace,
}

impl FacetPaginator {
    /// Paginate over an arbitrary facet space
    pub fn new(space: FacetSpace) -> Self {
        Self { space }
    }

    /// Paginate over a single dimension
    pub fn single(dimension: FacetDimension) -> Self {
        Self::new(FacetSpace::single(dimension))
    }

    /// Paginate over the cross product `outer` x `inner`
    pub fn cross(outer: FacetDimension, inner: FacetDimension) -> Result<Self> {
        FacetSpace::new(vec![outer, inner]).map(Self::new)
    }

    /// The space being walked
    pub fn space(&self) -> &FacetSpace {
        &self.space
    }
}

impl Paginator for FacetPaginator {
    fn name(&self) -> &'static str {
        if self.space.rank() > 1 {
            "cross_facets"
        } else {
            "facets"
        }
    }

    fn initial_state(&self) -> PaginationState {
        let start = self.space.start_position();
        if self.space.contains(&start) {
            PaginationState::at_position(start)
        } else {
            PaginationState::at_position(start).exhausted()
        }
    }

    fn request(&self, state: &PaginationState) -> Option<PageRequest> {
        if state.is_exhausted() {
            return None;
        }
        self.space
            .combination_at(&state.position)
            .map(|combination| PageRequest::Params(combination.to_params()))
    }

    fn advance(&self, state: &PaginationState, _page: &ClassifiedPage) -> Advance {
        match self.space.next_position(&state.position) {
            Some(position) => Advance::Next(state.with_position(position)),
            None => Advance::done(state, StopReason::FacetsExhausted),
        }
    }
}

// ============================================================================
// Latest-Facet Pagination
// ============================================================================

/// Incremental walk of the inner dimension within the most recent session.
///
/// The session is derived from a reference date (or the latest declared
/// session). On the first non-empty page the session reported by the data
/// is compared with the derived one; if they differ the observed value is
/// adopted for the rest of the run. Either way the value is then pinned.
#[derive(Debug, Clone)]
pub struct LatestFacetPaginator {
    outer: String,
    derived: String,
    facet_field: String,
    inner: FacetDimension,
}

impl LatestFacetPaginator {
    /// Paginate `inner` with `outer` fixed at `derived`
    pub fn new(outer: impl Into<String>, derived: impl Into<String>, inner: FacetDimension) -> Self {
        let outer = outer.into();
        Self {
            facet_field: outer.clone(),
            outer,
            derived: derived.into(),
            inner,
        }
    }

    /// Derive the session from `reference`, or fall back to the latest
    /// session declared on `outer`
    pub fn from_reference(
        outer: &FacetDimension,
        inner: FacetDimension,
        reference: Option<NaiveDate>,
    ) -> Result<Self> {
        let derived = match reference {
            Some(date) => SessionSpan::for_reference_date(date).token(),
            None => outer
                .latest_session()
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::invalid_value(
                        "pagination.outer",
                        format!("dimension '{}' declares no sessions", outer.name()),
                    )
                })?,
        };
        Ok(Self::new(outer.name(), derived, inner))
    }

    /// Record field carrying the outer facet value (defaults to its name)
    #[must_use]
    pub fn with_facet_field(mut self, field: impl Into<String>) -> Self {
        self.facet_field = field.into();
        self
    }

    /// The derived outer value
    pub fn derived(&self) -> &str {
        &self.derived
    }

    /// Outer value in effect for `state`
    pub fn outer_value<'a>(&'a self, state: &'a PaginationState) -> &'a str {
        state.pinned.as_deref().unwrap_or(&self.derived)
    }

    fn observed_value(&self, page: &ClassifiedPage) -> Option<String> {
        let first = page.records.first()?;
        match lookup_path(first, &self.facet_field)? {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

impl Paginator for LatestFacetPaginator {
    fn name(&self) -> &'static str {
        "latest_facet"
    }

    fn initial_state(&self) -> PaginationState {
        PaginationState::at_position(vec![0])
    }

    fn request(&self, state: &PaginationState) -> Option<PageRequest> {
        if state.is_exhausted() {
            return None;
        }
        let index = *state.position.first()?;
        let inner = self.inner.get(index)?;

        let mut params = StringMap::new();
        params.insert(self.outer.clone(), self.outer_value(state).to_string());
        params.insert(self.inner.name().to_string(), inner.to_string());
        Some(PageRequest::Params(params))
    }

    fn advance(&self, state: &PaginationState, page: &ClassifiedPage) -> Advance {
        let mut next = state.clone();

        if state.pinned.is_none() && !page.is_empty() {
            let pinned = match self.observed_value(page) {
                Some(observed) if observed != self.derived => {
                    warn!(
                        facet = %self.outer,
                        derived = %self.derived,
                        observed = %observed,
                        "Derived facet disagrees with data, adopting observed value"
                    );
                    observed
                }
                _ => self.derived.clone(),
            };
            next = next.with_pinned(pinned);
        }

        let index = state.position.first().copied().unwrap_or(0) + 1;
        if index < self.inner.len() {
            Advance::Next(next.with_position(vec![index]))
        } else {
            Advance::done(&next, StopReason::FacetsExhausted)
        }
    }
}

// ============================================================================
// Date Cursor Pagination
// ============================================================================

/// Walks forward through a date-like record field.
///
/// The first request carries no date filter. Each full page sets `param`
/// to the greatest `field` value seen on it. A page shorter than
/// `max_page_size` is taken as the last one. A full page whose cursor fails
/// to move past the previous one ends the run instead of repeating a request.
#[derive(Debug, Clone)]
pub struct DateCursorPaginator {
    param: String,
    field: String,
    max_page_size: usize,
}

impl DateCursorPaginator {
    /// Create a date cursor paginator
    pub fn new(param: impl Into<String>, field: impl Into<String>, max_page_size: usize) -> Self {
        Self {
            param: param.into(),
            field: field.into(),
            max_page_size,
        }
    }

    /// Greatest parseable date on the page, as its raw string
    fn page_max(&self, records: &[JsonValue]) -> Option<(NaiveDateTime, String)> {
        records
            .iter()
            .filter_map(|record| lookup_path(record, &self.field)?.as_str())
            .filter_map(|raw| parse_date_key(raw).map(|key| (key, raw.trim().to_string())))
            .max_by(|a, b| a.0.cmp(&b.0))
    }
}

impl Paginator for DateCursorPaginator {
    fn name(&self) -> &'static str {
        "date_cursor"
    }

    fn request(&self, state: &PaginationState) -> Option<PageRequest> {
        if state.is_exhausted() {
            return None;
        }
        Some(match &state.cursor {
            Some(cursor) => PageRequest::with_param(&self.param, cursor),
            None => PageRequest::base(),
        })
    }

    fn advance(&self, state: &PaginationState, page: &ClassifiedPage) -> Advance {
        if page.is_empty() {
            return Advance::done(state, StopReason::EmptyPage);
        }

        let Some((key, raw)) = self.page_max(&page.records) else {
            debug!(field = %self.field, "No parseable dates on page");
            return Advance::done(state, StopReason::NoCursorValues);
        };

        let stalled = state
            .cursor
            .as_deref()
            .and_then(parse_date_key)
            .is_some_and(|prev| key <= prev);

        // A short page is the end of data even when its dates repeat the cursor
        if page.len() < self.max_page_size {
            let last = if stalled {
                state.clone()
            } else {
                state.with_cursor(raw)
            };
            return Advance::done(
                &last,
                StopReason::ShortPage {
                    size: page.len(),
                    max: self.max_page_size,
                },
            );
        }

        if stalled {
            let cursor = state.cursor.clone().unwrap_or_default();
            debug!(param = %self.param, cursor = %cursor, "Date cursor did not advance");
            return Advance::done(state, StopReason::NoProgress { cursor });
        }
        Advance::Next(state.with_cursor(raw))
    }
}

/// Parse a date or timestamp into a comparable key
pub fn parse_date_key(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ============================================================================
// Next URL Pagination
// ============================================================================

/// Next URL pagination (URL in response body)
///
/// Follows a link such as `dokumentlista.@nasta_sida` until the API stops
/// returning one.
#[derive(Debug, Clone)]
pub struct NextUrlPaginator {
    path: String,
}

impl NextUrlPaginator {
    /// Create a new next URL paginator
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Paginator for NextUrlPaginator {
    fn name(&self) -> &'static str {
        "next_url"
    }

    fn request(&self, state: &PaginationState) -> Option<PageRequest> {
        if state.is_exhausted() {
            return None;
        }
        match &state.next_url {
            Some(url) => Some(PageRequest::Url(url.clone())),
            None if state.pages == 0 => Some(PageRequest::base()),
            None => None,
        }
    }

    fn advance(&self, state: &PaginationState, page: &ClassifiedPage) -> Advance {
        if page.is_empty() {
            return Advance::done(state, StopReason::EmptyPage);
        }

        let next_url = lookup_path(&page.body, &self.path)
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty());

        match next_url {
            Some(url) if state.next_url.as_deref() == Some(url) => Advance::done(
                state,
                StopReason::NoProgress {
                    cursor: url.to_string(),
                },
            ),
            Some(url) => Advance::Next(state.with_next_url(url)),
            None => Advance::done(state, StopReason::NoNextLink),
        }
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn name(&self) -> &'static str {
        "none"
    }

    fn request(&self, state: &PaginationState) -> Option<PageRequest> {
        (!state.is_exhausted() && state.pages == 0).then(PageRequest::base)
    }

    fn advance(&self, state: &PaginationState, _page: &ClassifiedPage) -> Advance {
        Advance::done(state, StopReason::SinglePage)
    }
}
