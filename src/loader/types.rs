//! Loader types
//!
//! Declarative source definition types for YAML parsing.

use crate::facet::{DateWindow, DimensionKind};
use crate::http::RateLimiterConfig;
use crate::state::IncrementalCursor;
use crate::types::{HarvestMode, StringMap, WriteMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Source Definition
// ============================================================================

/// Top-level source definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceDefinition {
    /// Source name
    pub name: String,
    /// Definition version
    #[serde(default = "default_version")]
    pub version: String,
    /// Base URL for all requests
    pub base_url: String,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpDefinition,
    /// Named facet dimensions shared by resources
    #[serde(default)]
    pub facets: Vec<FacetDefinition>,
    /// Resource definitions
    pub resources: Vec<ResourceDefinition>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl SourceDefinition {
    /// Look up a resource by name
    pub fn resource(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Look up a facet by name
    pub fn facet(&self, name: &str) -> Option<&FacetDefinition> {
        self.facets.iter().find(|f| f.name == name)
    }

    /// Names of all resources, in definition order
    pub fn resource_names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }
}

// ============================================================================
// HTTP Definition
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpDefinition {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retries
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            rate_limit: None,
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

// ============================================================================
// Facet Definition
// ============================================================================

/// A named facet dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FacetDefinition {
    /// Dimension name, also the query parameter
    pub name: String,
    /// Value encoding
    #[serde(default)]
    pub kind: DimensionKind,
    /// Ordered values
    pub values: Vec<String>,
}

// ============================================================================
// Resource Definition
// ============================================================================

/// Resource definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResourceDefinition {
    /// Resource name
    pub name: String,
    /// Human readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Endpoint path under the base URL
    pub path: String,
    /// Dot-separated path to the record list
    pub selector: String,
    /// Query parameters for every mode
    #[serde(default)]
    pub params: StringMap,
    /// Largest page the API returns
    #[serde(default)]
    pub max_page_size: Option<usize>,
    /// Parameter requesting `max_page_size` records
    #[serde(default)]
    pub page_size_param: Option<String>,
    /// Primary key fields
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Timestamp fields to normalise
    #[serde(default)]
    pub timestamp_fields: Vec<String>,
    /// Bounded historical harvest
    #[serde(default)]
    pub backfill: Option<ModeDefinition>,
    /// Harvest of records newer than the cursor
    #[serde(default)]
    pub incremental: Option<ModeDefinition>,
}

impl ResourceDefinition {
    /// The block for `mode`, falling back to the only declared block
    pub fn mode(&self, mode: HarvestMode) -> Option<(HarvestMode, &ModeDefinition)> {
        let (wanted, other, other_mode) = match mode {
            HarvestMode::Backfill => (
                &self.backfill,
                &self.incremental,
                HarvestMode::Incremental,
            ),
            HarvestMode::Incremental => {
                (&self.incremental, &self.backfill, HarvestMode::Backfill)
            }
        };
        match (wanted, other) {
            (Some(block), _) => Some((mode, block)),
            (None, Some(block)) => Some((other_mode, block)),
            (None, None) => None,
        }
    }
}

/// Per-mode settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModeDefinition {
    /// Destination write mode
    #[serde(default)]
    pub write_mode: WriteMode,
    /// Extra parameters, overriding the resource's
    #[serde(default)]
    pub params: StringMap,
    /// Incremental dedup cursor
    #[serde(default)]
    pub cursor: Option<IncrementalCursor>,
    /// Pagination strategy
    #[serde(default)]
    pub pagination: PaginationDefinition,
}

// ============================================================================
// Pagination Definition
// ============================================================================

/// Pagination strategy as written in YAML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationDefinition {
    /// Single request
    #[default]
    None,
    /// Link to the next page inside the body
    NextUrl {
        /// Selector path to the link
        path: String,
    },
    /// Cross product of named facets, outermost first
    Facets {
        /// Facet names
        dimensions: Vec<String>,
    },
    /// Inner facet within the session derived from the reference date
    LatestFacet {
        /// Session facet name
        outer: String,
        /// Facet iterated in full
        inner: String,
        /// Record field reporting the session
        #[serde(default)]
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

impl PaginationDefinition {
    /// Facet names this strategy refers to
    pub fn facet_names(&self) -> Vec<&str> {
        match self {
            Self::Facets { dimensions } => dimensions.iter().map(String::as_str).collect(),
            Self::LatestFacet { outer, inner, .. } => vec![outer.as_str(), inner.as_str()],
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Run Options
// ============================================================================

/// Per-run choices that turn a resource definition into a descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Requested mode
    pub mode: HarvestMode,
    /// Window for session facets and `{{ window.* }}` parameters
    pub window: DateWindow,
    /// Reference date for latest-facet derivation
    pub reference_date: Option<NaiveDate>,
    /// Overrides the cursor seed
    pub cursor_start: Option<String>,
}

impl RunOptions {
    /// Incremental run with no window
    pub fn incremental() -> Self {
        Self::default()
    }

    /// Backfill run over `window`
    pub fn backfill(window: DateWindow) -> Self {
        Self {
            mode: HarvestMode::Backfill,
            window,
            ..Default::default()
        }
    }

    /// Choose the mode from command line dates
    ///
    /// A start date (with or without an end date) or `full_refresh` selects
    /// backfill; a start date alone leaves the window open-ended. Otherwise
    /// the run is incremental and an end date alone is the latest-facet
    /// reference date.
    pub fn from_dates(
        start: Option<&str>,
        end: Option<&str>,
        full_refresh: bool,
    ) -> crate::error::Result<Self> {
        let window = DateWindow::parse(start, end)?;
        if full_refresh || window.start.is_some() {
            return Ok(Self::backfill(window));
        }
        Ok(Self {
            reference_date: window.end,
            ..Self::incremental()
        })
    }

    /// Set the reference date
    #[must_use]
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Override the cursor seed
    #[must_use]
    pub fn with_cursor_start(mut self, value: impl Into<String>) -> Self {
        self.cursor_start = Some(value.into());
        self
    }
}
