//! Classification types
//!
//! What the classifier makes of one response body.

use crate::types::JsonValue;
use std::fmt;

/// A response that yielded a record list
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPage {
    /// The envelope with the record list taken out
    pub body: JsonValue,
    /// Records at the selector path
    pub records: Vec<JsonValue>,
    /// Whether the page holds the maximum number of records
    pub full: bool,
}

impl ClassifiedPage {
    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True for a page without records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Why a response could not be classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedPage {
    /// Body is not valid JSON
    Unreadable(String),
    /// A key along the selector path is absent
    MissingSelector(String),
    /// The value at the selector path is not a list
    NotAList {
        /// Selector path
        selector: String,
        /// JSON type found instead
        found: &'static str,
    },
}

impl fmt::Display for MalformedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(message) => write!(f, "unreadable body: {message}"),
            Self::MissingSelector(selector) => write!(f, "selector '{selector}' not found"),
            Self::NotAList { selector, found } => {
                write!(f, "value at '{selector}' is {found}, not a list")
            }
        }
    }
}

/// Result of classifying one response
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A (possibly empty) page of records
    Page(ClassifiedPage),
    /// Treat as terminal-empty
    Malformed(MalformedPage),
}

impl Classification {
    /// Check if this is a malformed response
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// The page, if classification succeeded
    pub fn page(&self) -> Option<&ClassifiedPage> {
        match self {
            Self::Page(page) => Some(page),
            Self::Malformed(_) => None,
        }
    }
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "an object",
    }
}
