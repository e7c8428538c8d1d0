//! Template interpolation for resource parameters
//!
//! Handles `{{ variable }}` interpolation in YAML resource definitions.
//! Supports the run's date window (`{{ window.start }}`, `{{ window.end }}`),
//! the cursor seed (`{{ cursor.start_value }}`) and free variables.

use crate::error::{Error, Result};
use crate::facet::DateWindow;
use crate::types::StringMap;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template pattern is valid")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Date window bounds (`start`, `end`)
    pub window: Value,
    /// Cursor values (`start_value`)
    pub cursor: Value,
    /// Additional context variables
    pub vars: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose a window's bounds as `window.start` / `window.end`
    ///
    /// Unbounded sides render as empty strings.
    #[must_use]
    pub fn with_window(mut self, window: &DateWindow) -> Self {
        let fmt = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        self.window = json!({
            "start": fmt(window.start),
            "end": fmt(window.end),
        });
        self
    }

    /// Expose the cursor seed as `cursor.start_value`
    #[must_use]
    pub fn with_cursor_start(mut self, start_value: impl Into<String>) -> Self {
        self.cursor = json!({ "start_value": start_value.into() });
        self
    }

    /// Set additional variables
    #[must_use]
    pub fn with_vars(mut self, vars: Value) -> Self {
        self.vars = vars;
        self
    }

    /// Get a value by path (e.g., "window.start")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        let root = match parts[0] {
            "window" => &self.window,
            "cursor" => &self.cursor,
            "vars" => &self.vars,
            // Bare names resolve against vars
            _ => return get_nested_value(&self.vars, &parts),
        };

        if parts.len() == 1 {
            Some(root)
        } else {
            get_nested_value(root, &parts[1..])
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut result = template.to_string();
    let mut errors = Vec::new();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let full_match = &cap[0];
        let var_path = &cap[1];

        match ctx.get(var_path) {
            Some(value) => {
                result = result.replace(full_match, &value_to_string(value));
            }
            None => errors.push(var_path.to_string()),
        }
    }

    if errors.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Render every value of a parameter map
///
/// A parameter whose rendered value is empty is dropped, so an unbounded
/// window side never reaches the API as `from=`.
pub fn render_params(params: &StringMap, ctx: &TemplateContext) -> Result<StringMap> {
    let mut rendered = StringMap::new();
    for (key, value) in params {
        if !has_templates(value) {
            rendered.insert(key.clone(), value.clone());
            continue;
        }
        let value = render(value, ctx)
            .map_err(|e| Error::template(format!("parameter '{key}': {e}")))?;
        if !value.is_empty() {
            rendered.insert(key.clone(), value);
        }
    }
    Ok(rendered)
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn window(start: Option<&str>, end: Option<&str>) -> DateWindow {
        DateWindow::parse(start, end).unwrap()
    }

    #[test]
    fn test_window_substitution() {
        let ctx = TemplateContext::new().with_window(&window(Some("2024-01-01"), Some("2024-06-30")));
        let result = render("{{ window.start }}..{{ window.end }}", &ctx).unwrap();
        assert_eq!(result, "2024-01-01..2024-06-30");
    }

    #[test]
    fn test_cursor_substitution() {
        let ctx = TemplateContext::new().with_cursor_start("2024-01-01 00:00:00");
        assert_eq!(
            render("{{cursor.start_value}}", &ctx).unwrap(),
            "2024-01-01 00:00:00"
        );
    }

    #[test]
    fn test_bare_names_resolve_to_vars() {
        let ctx = TemplateContext::new().with_vars(json!({"doktyp": "mot", "limit": 200}));
        assert_eq!(
            render("{{ doktyp }}/{{ vars.limit }}", &ctx).unwrap(),
            "mot/200"
        );
    }

    #[test]
    fn test_undefined_variable() {
        let ctx = TemplateContext::new();
        let err = render("{{ window.start }}", &ctx).unwrap_err();
        assert!(err.to_string().contains("window.start"));
    }

    #[test]
    fn test_render_params_drops_empty_values() {
        let ctx = TemplateContext::new().with_window(&window(Some("2024-01-01"), None));
        let params: StringMap = [
            ("from", "{{ window.start }}"),
            ("tom", "{{ window.end }}"),
            ("utformat", "json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let rendered = render_params(&params, &ctx).unwrap();
        assert_eq!(rendered.get("from").map(String::as_str), Some("2024-01-01"));
        assert!(!rendered.contains_key("tom"));
        assert_eq!(rendered.get("utformat").map(String::as_str), Some("json"));
    }

    #[test]
    fn test_render_params_names_the_parameter() {
        let params: StringMap = [("from".to_string(), "{{ nope }}".to_string())].into();
        let err = render_params(&params, &TemplateContext::new()).unwrap_err();
        assert!(err.to_string().contains("parameter 'from'"));
    }

    #[test]
    fn test_has_templates() {
        assert!(has_templates("{{ window.start }}"));
        assert!(has_templates("prefix {{ var }} suffix"));
        assert!(!has_templates("no templates here"));
        assert!(!has_templates("{ not a template }"));
    }

    #[test]
    fn test_extract_variables() {
        let vars = extract_variables("{{ window.start }} and {{ cursor.start_value }}");
        assert_eq!(vars, vec!["window.start", "cursor.start_value"]);
    }
}
