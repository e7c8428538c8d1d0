//! Request targets and parameter injection
//!
//! A request is either a structured URL + parameter map or a raw URL string
//! (e.g. a "next page" link returned by the API). Injection has the same
//! semantics for both: supplied keys overwrite, everything else is kept.

use crate::error::Result;
use crate::types::StringMap;
use std::fmt;
use url::Url;

/// Outgoing request representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// Endpoint URL plus a parameter map
    Structured {
        /// Endpoint URL (may already carry a query string)
        url: String,
        /// Query parameters
        params: StringMap,
    },
    /// A complete URL whose query string carries the parameters
    RawUrl(String),
}

impl RequestTarget {
    /// Structured target for `path` under `base_url`
    pub fn for_endpoint(base_url: &str, path: &str, params: StringMap) -> Self {
        Self::Structured {
            url: join_url(base_url, path),
            params,
        }
    }

    /// Raw URL target
    pub fn raw(url: impl Into<String>) -> Self {
        Self::RawUrl(url.into())
    }

    /// Apply `params`, overwriting same-named parameters
    pub fn inject(self, params: &StringMap) -> Result<Self> {
        if params.is_empty() {
            return Ok(self);
        }
        match self {
            Self::Structured { url, params: existing } => Ok(Self::Structured {
                url,
                params: merge_structured(existing, params),
            }),
            Self::RawUrl(url) => merge_raw_url(&url, params).map(Self::RawUrl),
        }
    }

    /// Current value of a parameter
    pub fn param(&self, key: &str) -> Option<String> {
        match self {
            Self::Structured { url, params } => params.get(key).cloned().or_else(|| {
                Url::parse(url).ok().and_then(|u| {
                    u.query_pairs()
                        .find(|(k, _)| k == key)
                        .map(|(_, v)| v.into_owned())
                })
            }),
            Self::RawUrl(url) => Url::parse(url).ok().and_then(|u| {
                u.query_pairs()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.into_owned())
            }),
        }
    }

    /// Resolve to a full URL with every parameter in the query string
    pub fn to_url(&self) -> Result<Url> {
        match self {
            Self::Structured { url, params } => Ok(Url::parse(&merge_raw_url(url, params)?)?),
            Self::RawUrl(url) => Ok(Url::parse(url)?),
        }
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_url() {
            Ok(url) => write!(f, "{url}"),
            Err(_) => match self {
                Self::Structured { url, .. } | Self::RawUrl(url) => f.write_str(url),
            },
        }
    }
}

fn merge_structured(mut existing: StringMap, params: &StringMap) -> StringMap {
    for (key, value) in params {
        existing.insert(key.clone(), value.clone());
    }
    existing
}

fn merge_raw_url(url: &str, params: &StringMap) -> Result<String> {
    let mut parsed = Url::parse(url)?;

    // Keep untouched pairs in their original order, drop every occurrence of
    // an overwritten key, then append the new values.
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !params.contains_key(&**k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() && params.is_empty() {
        parsed.set_query(None);
        return Ok(parsed.into());
    }

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .extend_pairs(params.iter());
    Ok(parsed.into())
}

/// Join a base URL and a path with exactly one slash
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
