//! Response decode module
//!
//! # Overview
//!
//! Turns raw response bodies into record pages. The [`ResponseClassifier`]
//! never fails on bad payloads: anything that is not a record list at the
//! selector path is classified as malformed so pagination can stop cleanly.

mod classifier;
mod normalize;
mod types;

pub use classifier::ResponseClassifier;
pub use normalize::{parse_timestamp, TimestampNormalizer};
pub use types::{ClassifiedPage, Classification, MalformedPage};
