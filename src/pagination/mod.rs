//! Pagination module
//!
//! Supports: Facets (one or two dimensions), Latest Facet, Date Cursor,
//! Next URL, None
//!
//! # Overview
//!
//! Each strategy says what the next request looks like and what follows a
//! classified page. Strategies are stateless; progress lives in the
//! [`PaginationState`](crate::state::PaginationState) value the controller
//! threads through them, so every transition can be tested in isolation.

mod strategies;
mod types;

pub use strategies::{
    parse_date_key, DateCursorPaginator, FacetPaginator, LatestFacetPaginator, NextUrlPaginator,
    NoPaginator,
};
pub use types::{Advance, PageRequest, Paginator, StopReason};
