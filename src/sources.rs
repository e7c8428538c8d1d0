//! Built-in source definitions embedded in the binary
//!
//! Lets users run `riksdagen-harvest run voteringlista` without pointing
//! at a YAML file.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Name of the source used when `--source` is not given
pub const DEFAULT_SOURCE: &str = "riksdagen";

/// Built-in source YAML definitions
pub static BUILTIN_SOURCES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("riksdagen", include_str!("../sources/riksdagen.yaml"));
    m
});

/// Get a built-in source by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_SOURCES.get(name).copied()
}

/// Check if a name refers to a built-in source
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_SOURCES.contains_key(name)
}

/// List all built-in source names
pub fn list_builtin() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTIN_SOURCES.keys().copied().collect();
    names.sort_unstable();
    names
}
