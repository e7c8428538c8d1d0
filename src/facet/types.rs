//! Facet types
//!
//! Dimensions, spaces and combinations. A [`FacetSpace`] is immutable once
//! built; narrowing it (see [`super::DateWindowFilter`]) produces a new space.

use crate::error::{Error, Result};
use crate::types::StringMap;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Month in which a parliamentary session opens
pub const SESSION_START_MONTH: u32 = 9;

/// What the values of a dimension encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    /// Opaque values (districts, categories)
    #[default]
    List,
    /// Session tokens spanning two calendar years, e.g. `2024/25`
    Session,
}

// ============================================================================
// Session Span
// ============================================================================

/// The calendar span of a session token such as `2024/25`.
///
/// A session opens on 1 September of its start year and closes on 31 August
/// of its end year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionSpan {
    /// Year the session opens
    pub start_year: i32,
    /// Year the session closes
    pub end_year: i32,
}

impl SessionSpan {
    /// Parse a `YYYY/YY` token
    pub fn parse(token: &str) -> Option<Self> {
        let (start, suffix) = token.trim().split_once('/')?;
        if start.len() != 4 || suffix.len() != 2 {
            return None;
        }
        let start_year: i32 = start.parse().ok()?;
        let suffix: i32 = suffix.parse().ok()?;

        // "1999/00" closes in 2000, not 1900
        let mut end_year = start_year - start_year.rem_euclid(100) + suffix;
        if end_year < start_year {
            end_year += 100;
        }
        if end_year != start_year + 1 {
            return None;
        }

        Some(Self {
            start_year,
            end_year,
        })
    }

    /// The session that opens in `year`
    pub fn opening_in(year: i32) -> Self {
        Self {
            start_year: year,
            end_year: year + 1,
        }
    }

    /// The session that opens in the calendar year of `date`
    pub fn for_reference_date(date: NaiveDate) -> Self {
        Self::opening_in(date.year())
    }

    /// First day of the session
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, SESSION_START_MONTH, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the session
    pub fn last_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.end_year, SESSION_START_MONTH, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Whether the session's years overlap the years of the inclusive range.
    ///
    /// Only calendar years are compared, so a window in spring 2024 matches
    /// both `2023/24` and `2024/25`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_year <= end.year() && self.end_year >= start.year()
    }

    /// Render as the API token, e.g. `2024/25`
    pub fn token(&self) -> String {
        format!("{}/{:02}", self.start_year, self.end_year.rem_euclid(100))
    }
}

impl fmt::Display for SessionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

// ============================================================================
// Date Window
// ============================================================================

/// Inclusive `(start, end)` date window; both bounds optional
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    /// Inclusive start
    pub start: Option<NaiveDate>,
    /// Inclusive end
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// Create a window, rejecting inverted bounds
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(Error::invalid_value(
                    "date_window",
                    format!("start date {s} is after end date {e}"),
                ));
            }
        }
        Ok(Self { start, end })
    }

    /// A window with no bounds (no filtering)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Parse `YYYY-MM-DD` bounds
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = start.map(|s| parse_date("start_date", s)).transpose()?;
        let end = end.map(|s| parse_date("end_date", s)).transpose()?;
        Self::new(start, end)
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// True when both bounds are set
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        Error::invalid_value(field, format!("'{value}' is not a YYYY-MM-DD date: {e}"))
    })
}

// ============================================================================
// Facet Dimension
// ============================================================================

/// One enumerable dimension: a name and a fixed, ordered value sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetDimension {
    name: String,
    kind: DimensionKind,
    values: Vec<String>,
}

impl FacetDimension {
    /// Create a list dimension
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Result<Self> {
        Self::with_kind(name, DimensionKind::List, values)
    }

    /// Create a session dimension; every value must be a `YYYY/YY` token
    pub fn sessions(name: impl Into<String>, values: Vec<String>) -> Result<Self> {
        Self::with_kind(name, DimensionKind::Session, values)
    }

    /// Create a dimension of the given kind
    pub fn with_kind(
        name: impl Into<String>,
        kind: DimensionKind,
        values: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::config("Facet dimension name cannot be empty"));
        }
        if values.is_empty() {
            return Err(Error::invalid_value(
                format!("facets.{name}"),
                "dimension has no values",
            ));
        }

        let mut seen = HashSet::new();
        for value in &values {
            if !seen.insert(value.as_str()) {
                return Err(Error::invalid_value(
                    format!("facets.{name}"),
                    format!("duplicate value '{value}'"),
                ));
            }
            if kind == DimensionKind::Session && SessionSpan::parse(value).is_none() {
                return Err(Error::invalid_value(
                    format!("facets.{name}"),
                    format!("'{value}' is not a YYYY/YY session token"),
                ));
            }
        }

        Ok(Self { name, kind, values })
    }

    /// Dimension name (also the query parameter name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension kind
    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    /// Ordered values
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed dimension
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at an index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Session spans of the values, in order (empty for list dimensions)
    pub fn spans(&self) -> Vec<(usize, SessionSpan)> {
        if self.kind != DimensionKind::Session {
            return Vec::new();
        }
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| SessionSpan::parse(v).map(|span| (i, span)))
            .collect()
    }

    /// The most recent session value, if this is a session dimension
    pub fn latest_session(&self) -> Option<&str> {
        self.spans()
            .into_iter()
            .max_by_key(|(_, span)| *span)
            .and_then(|(i, _)| self.get(i))
    }

    /// Copy keeping only the values at `indices` (order preserved)
    pub(crate) fn retain_indices(&self, indices: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            values: indices
                .iter()
                .filter_map(|&i| self.values.get(i).cloned())
                .collect(),
        }
    }
}

// ============================================================================
// Facet Space
// ============================================================================

/// Ordered list of dimensions, enumerated row-major (first dimension slowest)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSpace {
    dimensions: Vec<FacetDimension>,
}

impl FacetSpace {
    /// Create a space from one or more dimensions with distinct names
    pub fn new(dimensions: Vec<FacetDimension>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(Error::config("Facet space needs at least one dimension"));
        }
        let mut names = HashSet::new();
        for dim in &dimensions {
            if !names.insert(dim.name()) {
                return Err(Error::config(format!(
                    "Facet dimension '{}' declared twice",
                    dim.name()
                )));
            }
        }
        Ok(Self { dimensions })
    }

    /// A space over a single dimension
    pub fn single(dimension: FacetDimension) -> Self {
        Self {
            dimensions: vec![dimension],
        }
    }

    /// Dimensions in declaration order
    pub fn dimensions(&self) -> &[FacetDimension] {
        &self.dimensions
    }

    /// Look up a dimension by name
    pub fn dimension(&self, name: &str) -> Option<&FacetDimension> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Total number of combinations (product of dimension lengths)
    pub fn len(&self) -> usize {
        self.dimensions.iter().map(FacetDimension::len).product()
    }

    /// True if any dimension is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first position (all zeros)
    pub fn start_position(&self) -> Vec<usize> {
        vec![0; self.dimensions.len()]
    }

    /// Whether `position` addresses a combination in this space
    pub fn contains(&self, position: &[usize]) -> bool {
        position.len() == self.dimensions.len()
            && position
                .iter()
                .zip(&self.dimensions)
                .all(|(&i, d)| i < d.len())
    }

    /// The combination at `position`
    pub fn combination_at(&self, position: &[usize]) -> Option<FacetCombination> {
        if !self.contains(position) {
            return None;
        }
        let pairs = position
            .iter()
            .zip(&self.dimensions)
            .filter_map(|(&i, d)| d.get(i).map(|v| (d.name().to_string(), v.to_string())))
            .collect();
        Some(FacetCombination { pairs })
    }

    /// The position after `position` in row-major order, or None past the end
    pub fn next_position(&self, position: &[usize]) -> Option<Vec<usize>> {
        if !self.contains(position) {
            return None;
        }
        let mut next = position.to_vec();
        for axis in (0..next.len()).rev() {
            next[axis] += 1;
            if next[axis] < self.dimensions[axis].len() {
                return Some(next);
            }
            next[axis] = 0;
        }
        None
    }

    /// Iterate every combination exactly once, in row-major order
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            space: self,
            position: Some(self.start_position()).filter(|p| self.contains(p)),
        }
    }

    /// Replace the dimension with the same name
    pub fn with_dimension(&self, dimension: FacetDimension) -> Self {
        let dimensions = self
            .dimensions
            .iter()
            .map(|d| {
                if d.name() == dimension.name() {
                    dimension.clone()
                } else {
                    d.clone()
                }
            })
            .collect();
        Self { dimensions }
    }
}

/// Row-major iterator over a [`FacetSpace`]
#[derive(Debug)]
pub struct Combinations<'a> {
    space: &'a FacetSpace,
    position: Option<Vec<usize>>,
}

impl Iterator for Combinations<'_> {
    type Item = FacetCombination;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.position.take()?;
        self.position = self.space.next_position(&current);
        self.space.combination_at(&current)
    }
}

// ============================================================================
// Facet Combination
// ============================================================================

/// One concrete value per dimension: the parameter set for one request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FacetCombination {
    pairs: Vec<(String, String)>,
}

impl FacetCombination {
    /// Build from `(dimension, value)` pairs
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: Vec<(K, V)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value for a dimension
    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, value)| value.as_str())
    }

    /// Pairs in dimension order
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// As query parameters
    pub fn to_params(&self) -> StringMap {
        self.pairs.iter().cloned().collect()
    }
}

impl fmt::Display for FacetCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}
