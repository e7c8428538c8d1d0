//! Response classifier
//!
//! Extracts the record list from a nested JSON envelope.

use super::types::{json_type_name, ClassifiedPage, Classification, MalformedPage};
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Extracts records at a dot-separated selector path and reports fullness.
///
/// Anything that is not a record list (unreadable body, missing key, wrong
/// type) classifies as [`Classification::Malformed`] instead of erroring.
/// An explicit `null` at the selector is an empty page.
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    selector: Vec<String>,
    max_page_size: Option<usize>,
}

impl ResponseClassifier {
    /// Create a classifier for `selector` (e.g. `voteringlista.votering`)
    pub fn new(selector: &str) -> Result<Self> {
        let parts: Vec<String> = selector.split('.').map(str::to_string).collect();
        if selector.trim().is_empty() || parts.iter().any(String::is_empty) {
            return Err(Error::invalid_value(
                "selector",
                format!("'{selector}' is not a dot-separated key path"),
            ));
        }
        Ok(Self {
            selector: parts,
            max_page_size: None,
        })
    }

    /// Set the page size at which a page counts as full
    #[must_use]
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = Some(size);
        self
    }

    /// Selector path as written
    pub fn selector(&self) -> String {
        self.selector.join(".")
    }

    /// Classify a raw response body
    pub fn classify(&self, body: &str) -> Classification {
        match serde_json::from_str::<JsonValue>(body) {
            Ok(value) => self.classify_value(value),
            Err(e) => Classification::Malformed(MalformedPage::Unreadable(e.to_string())),
        }
    }

    /// Classify an already parsed body
    pub fn classify_value(&self, mut body: JsonValue) -> Classification {
        let Some(slot) = self.slot_mut(&mut body) else {
            return Classification::Malformed(MalformedPage::MissingSelector(self.selector()));
        };

        let records = match slot.take() {
            JsonValue::Array(records) => records,
            JsonValue::Null => Vec::new(),
            other => {
                let found = json_type_name(&other);
                *slot = other;
                return Classification::Malformed(MalformedPage::NotAList {
                    selector: self.selector(),
                    found,
                });
            }
        };

        let full = self
            .max_page_size
            .is_some_and(|max| max > 0 && records.len() >= max);

        Classification::Page(ClassifiedPage {
            body,
            records,
            full,
        })
    }

    fn slot_mut<'a>(&self, body: &'a mut JsonValue) -> Option<&'a mut JsonValue> {
        self.selector
            .iter()
            .try_fold(body, |current, key| current.as_object_mut()?.get_mut(key))
    }
}
