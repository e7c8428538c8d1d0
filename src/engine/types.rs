//! Engine types
//!
//! Resource descriptors, page outcomes and harvest configuration.

use crate::facet::{DateWindow, FacetDimension, FacetSpace};
use crate::pagination::StopReason;
use crate::state::IncrementalCursor;
use crate::types::{JsonValue, StringMap, WriteMode};
use chrono::NaiveDate;

// ============================================================================
// Resource Descriptor
// ============================================================================

/// How a resource is paginated, with its facets already resolved
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaginationSpec {
    /// One request
    #[default]
    None,
    /// Follow a link in the response body
    NextUrl {
        /// Selector path to the link
        path: String,
    },
    /// One request per combination, narrowed by the date window
    Facets {
        /// Space before date narrowing
        space: FacetSpace,
    },
    /// Inner dimension within the session derived from `reference`
    LatestFacet {
        /// Session dimension (param name and fallback value)
        outer: FacetDimension,
        /// Dimension iterated in full
        inner: FacetDimension,
        /// Reference date for the session derivation
        reference: Option<NaiveDate>,
        /// Record field reporting the session, if not the param name
        facet_field: Option<String>,
    },
    /// Walk forward through a date field
    DateCursor {
        /// Query parameter carrying the date
        param: String,
        /// Record field holding the date
        field: String,
    },
}

impl PaginationSpec {
    /// Strategy name as written in source definitions
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NextUrl { .. } => "next_url",
            Self::Facets { .. } => "facets",
            Self::LatestFacet { .. } => "latest_facet",
            Self::DateCursor { .. } => "date_cursor",
        }
    }
}

/// Everything the engine needs to harvest one resource in one mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceDescriptor {
    /// Resource (and destination table) name
    pub name: String,
    /// API base URL
    pub base_url: String,
    /// Endpoint path under the base URL
    pub endpoint_path: String,
    /// Query parameters sent with every request
    pub static_params: StringMap,
    /// Dot-separated path to the record list
    pub selector_path: String,
    /// Largest page the API will return
    pub max_page_size: Option<usize>,
    /// Query parameter that requests `max_page_size` records
    pub page_size_param: Option<String>,
    /// Pagination strategy
    pub pagination: PaginationSpec,
    /// Window applied to session facets
    pub date_window: DateWindow,
    /// Incremental dedup cursor
    pub cursor: Option<IncrementalCursor>,
    /// Timestamp fields normalised on every record
    pub timestamp_fields: Vec<String>,
    /// Destination write mode, forwarded to the sink
    pub write_mode: WriteMode,
    /// Primary key fields, forwarded to the sink
    pub primary_key: Vec<String>,
}

impl ResourceDescriptor {
    /// Create a descriptor with the required fields
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        endpoint_path: impl Into<String>,
        selector_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            endpoint_path: endpoint_path.into(),
            selector_path: selector_path.into(),
            ..Default::default()
        }
    }

    /// Add a static query parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.static_params.insert(key.into(), value.into());
        self
    }

    /// Set the maximum page size and the parameter that requests it
    #[must_use]
    pub fn with_page_size(mut self, param: Option<&str>, max: usize) -> Self {
        self.page_size_param = param.map(str::to_string);
        self.max_page_size = Some(max);
        self
    }

    /// Set the pagination strategy
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationSpec) -> Self {
        self.pagination = pagination;
        self
    }

    /// Set the date window
    #[must_use]
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.date_window = window;
        self
    }

    /// Set the incremental cursor
    #[must_use]
    pub fn with_cursor(mut self, cursor: IncrementalCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Normalise a timestamp field on every record
    #[must_use]
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_fields.push(field.into());
        self
    }

    /// Set write mode and primary key
    #[must_use]
    pub fn with_write_mode(mut self, mode: WriteMode, primary_key: Vec<String>) -> Self {
        self.write_mode = mode;
        self.primary_key = primary_key;
        self
    }
}

// ============================================================================
// Page Outcome
// ============================================================================

/// What one controller step produced
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Records from a page; more pages follow
    Continue(Vec<JsonValue>),
    /// Records from the last page
    Terminate(Vec<JsonValue>, StopReason),
    /// The page could not be used; the run stops with what it already has
    Fail(StopReason),
}

impl PageOutcome {
    /// Records carried by this outcome
    pub fn records(&self) -> &[JsonValue] {
        match self {
            Self::Continue(records) | Self::Terminate(records, _) => records,
            Self::Fail(_) => &[],
        }
    }

    /// Take the records out
    pub fn into_records(self) -> Vec<JsonValue> {
        match self {
            Self::Continue(records) | Self::Terminate(records, _) => records,
            Self::Fail(_) => Vec::new(),
        }
    }

    /// Why the run ended, if this was its last step
    pub fn stop_reason(&self) -> Option<&StopReason> {
        match self {
            Self::Continue(_) => None,
            Self::Terminate(_, reason) | Self::Fail(reason) => Some(reason),
        }
    }

    /// Check if the run continues after this step
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }
}

// ============================================================================
// Harvest Config / Stats
// ============================================================================

/// Configuration for a harvest run
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Records per sink write
    pub batch_size: usize,
    /// Stop after this many records
    pub max_records: Option<usize>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_records: None,
        }
    }
}

impl HarvestConfig {
    /// Create a new harvest config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set batch size
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set max records
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }
}

/// Statistics from a harvest run
#[derive(Debug, Clone, Default)]
pub struct HarvestStats {
    /// Records handed to the sink
    pub records: u64,
    /// Pages fetched
    pub pages: u64,
    /// Records dropped as already harvested
    pub filtered: u64,
    /// Records emitted without a usable cursor value
    pub unreadable_cursor: u64,
    /// Why the run ended
    pub stop_reason: Option<StopReason>,
    /// Highest cursor value observed
    pub final_cursor: Option<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl HarvestStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages += 1;
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records += count as u64;
    }

    /// Whether the run ended on a warning-level stop
    pub fn truncated(&self) -> bool {
        self.stop_reason.as_ref().is_some_and(StopReason::is_warning)
    }
}
