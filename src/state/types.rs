//! Pagination state
//!
//! An immutable value threaded through the controller: each step consumes
//! the previous state and returns a new one. Nothing here is persisted.

/// Lifecycle phase of a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Positioned on the next request
    #[default]
    Ready,
    /// A request for the current position is in flight
    Fetching,
    /// No further requests will be issued
    Exhausted,
}

/// Tracks pagination progress during one run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationState {
    /// Current index per facet dimension
    pub position: Vec<usize>,
    /// Lifecycle phase
    pub phase: Phase,
    /// Last computed cursor (date filter) value
    pub cursor: Option<String>,
    /// Facet value pinned after observing it in the data
    pub pinned: Option<String>,
    /// Next URL for link-based pagination
    pub next_url: Option<String>,
    /// Pages processed so far
    pub pages: u64,
    /// Records seen so far
    pub total_fetched: u64,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state positioned at the start of a facet space
    pub fn at_position(position: Vec<usize>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// True once the traversal is over
    pub fn is_exhausted(&self) -> bool {
        self.phase == Phase::Exhausted
    }

    /// Mark the current position as requested
    #[must_use]
    pub fn fetching(&self) -> Self {
        if self.is_exhausted() {
            return self.clone();
        }
        Self {
            phase: Phase::Fetching,
            ..self.clone()
        }
    }

    /// Record a processed page of `count` records
    #[must_use]
    pub fn with_page(&self, count: usize) -> Self {
        Self {
            pages: self.pages + 1,
            total_fetched: self.total_fetched + count as u64,
            ..self.clone()
        }
    }

    /// Move to a new facet position, ready for the next request
    #[must_use]
    pub fn with_position(&self, position: Vec<usize>) -> Self {
        if self.is_exhausted() {
            return self.clone();
        }
        Self {
            position,
            phase: Phase::Ready,
            ..self.clone()
        }
    }

    /// Set the cursor for the next request
    #[must_use]
    pub fn with_cursor(&self, cursor: impl Into<String>) -> Self {
        if self.is_exhausted() {
            return self.clone();
        }
        Self {
            cursor: Some(cursor.into()),
            phase: Phase::Ready,
            ..self.clone()
        }
    }

    /// Set the next URL for the next request
    #[must_use]
    pub fn with_next_url(&self, url: impl Into<String>) -> Self {
        if self.is_exhausted() {
            return self.clone();
        }
        Self {
            next_url: Some(url.into()),
            phase: Phase::Ready,
            ..self.clone()
        }
    }

    /// Pin a facet value observed in the data
    #[must_use]
    pub fn with_pinned(&self, value: impl Into<String>) -> Self {
        Self {
            pinned: Some(value.into()),
            ..self.clone()
        }
    }

    /// End the traversal; irreversible
    #[must_use]
    pub fn exhausted(&self) -> Self {
        Self {
            phase: Phase::Exhausted,
            ..self.clone()
        }
    }
}
