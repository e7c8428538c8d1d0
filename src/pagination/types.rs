//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::decode::{ClassifiedPage, MalformedPage};
use crate::state::PaginationState;
use crate::types::StringMap;
use std::fmt;

/// What the next request should look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Parameters to inject into the resource's base request
    Params(StringMap),
    /// A complete URL returned by the API
    Url(String),
}

impl PageRequest {
    /// A request with no extra parameters
    pub fn base() -> Self {
        Self::Params(StringMap::new())
    }

    /// A request with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut params = StringMap::new();
        params.insert(key.into(), value.into());
        Self::Params(params)
    }
}

/// Why a traversal ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Every facet combination was requested
    FacetsExhausted,
    /// The API returned no records
    EmptyPage,
    /// Fewer records than the page maximum; taken as the last page
    ShortPage {
        /// Records on the page
        size: usize,
        /// Configured maximum page size
        max: usize,
    },
    /// The next cursor would repeat the previous request
    NoProgress {
        /// Cursor value that failed to advance
        cursor: String,
    },
    /// No record on the page carried a usable cursor field
    NoCursorValues,
    /// The response carried no next-page link
    NoNextLink,
    /// Single-request resource
    SinglePage,
    /// The response could not be classified
    Malformed(MalformedPage),
    /// The caller's record limit was reached
    RecordLimit,
    /// The strategy had nothing left to request
    Finished,
}

impl StopReason {
    /// Stops that may have truncated the harvest
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::NoProgress { .. } | Self::Malformed(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FacetsExhausted => f.write_str("all facet combinations visited"),
            Self::EmptyPage => f.write_str("empty page"),
            Self::ShortPage { size, max } => write!(f, "short page ({size} < {max})"),
            Self::NoProgress { cursor } => write!(f, "cursor did not advance past '{cursor}'"),
            Self::NoCursorValues => f.write_str("no cursor values on page"),
            Self::NoNextLink => f.write_str("no next link"),
            Self::SinglePage => f.write_str("single page resource"),
            Self::Malformed(reason) => write!(f, "malformed response: {reason}"),
            Self::RecordLimit => f.write_str("record limit reached"),
            Self::Finished => f.write_str("nothing left to request"),
        }
    }
}

/// Result of advancing past one classified page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Issue another request from this state
    Next(PaginationState),
    /// Traversal is over
    Done(PaginationState, StopReason),
}

impl Advance {
    /// Finish the traversal, marking the state exhausted
    pub fn done(state: &PaginationState, reason: StopReason) -> Self {
        Self::Done(state.exhausted(), reason)
    }

    /// Check if the traversal continues
    pub fn is_next(&self) -> bool {
        matches!(self, Self::Next(_))
    }

    /// The resulting state
    pub fn state(&self) -> &PaginationState {
        match self {
            Self::Next(state) | Self::Done(state, _) => state,
        }
    }

    /// The stop reason, if finished
    pub fn stop_reason(&self) -> Option<&StopReason> {
        match self {
            Self::Next(_) => None,
            Self::Done(_, reason) => Some(reason),
        }
    }
}

/// Core trait for pagination strategies.
///
/// Strategies hold no iteration state of their own. Everything that changes
/// between pages lives in the [`PaginationState`] the controller threads
/// through `request` and `advance`.
pub trait Paginator: Send + Sync + fmt::Debug {
    /// Short strategy name for logs
    fn name(&self) -> &'static str;

    /// State before the first request
    fn initial_state(&self) -> PaginationState {
        PaginationState::new()
    }

    /// Request for `state`, or None when there is nothing left to fetch
    fn request(&self, state: &PaginationState) -> Option<PageRequest>;

    /// Decide what follows a successfully classified page
    fn advance(&self, state: &PaginationState, page: &ClassifiedPage) -> Advance;
}
