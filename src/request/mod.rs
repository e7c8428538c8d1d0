//! Request module
//!
//! Builds outgoing requests and injects facet/cursor parameters into them,
//! uniformly over structured and raw-URL request shapes.

mod target;

pub use target::{join_url, RequestTarget};
