//! YAML parser for source definitions
//!
//! Parses and validates source YAML files.
//! Supports both built-in sources (by name) and custom YAML files (by path).

use crate::error::{Error, Result};
use crate::facet::FacetDimension;
use crate::loader::types::{PaginationDefinition, ResourceDefinition, SourceDefinition};
use crate::sources;
use crate::types::WriteMode;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use url::Url;

/// Load a source definition from a name or file path
///
/// A bare name such as `riksdagen` resolves to a built-in source; anything
/// else is read from disk.
pub fn load_source(path: impl AsRef<Path>) -> Result<SourceDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = sources::get_builtin(&path_str) {
            return load_source_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!(
                "Source '{}' not found. Built-in sources: {}. Or provide a path to a YAML file.",
                path.display(),
                sources::list_builtin().join(", ")
            ))
        } else {
            Error::config(format!(
                "Failed to read source file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_source_from_str(&content)
}

/// Load a source definition from a YAML string
pub fn load_source_from_str(yaml: &str) -> Result<SourceDefinition> {
    let def: SourceDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse source YAML: {e}")))?;

    validate_source(&def)?;
    Ok(def)
}

/// Validate a source definition
fn validate_source(def: &SourceDefinition) -> Result<()> {
    if def.name.is_empty() {
        return Err(Error::config("Source name cannot be empty"));
    }

    if def.base_url.is_empty() {
        return Err(Error::config("Source base_url cannot be empty"));
    }
    Url::parse(&def.base_url)
        .map_err(|e| Error::invalid_value("base_url", format!("'{}': {e}", def.base_url)))?;

    if def.resources.is_empty() {
        return Err(Error::config("Source must have at least one resource"));
    }

    let facet_names: HashSet<_> = def.facets.iter().map(|f| f.name.as_str()).collect();
    if facet_names.len() != def.facets.len() {
        return Err(Error::config("Duplicate facet names found"));
    }
    for facet in &def.facets {
        FacetDimension::with_kind(&facet.name, facet.kind, facet.values.clone())?;
    }

    let resource_names: HashSet<_> = def.resources.iter().map(|r| r.name.as_str()).collect();
    if resource_names.len() != def.resources.len() {
        return Err(Error::config("Duplicate resource names found"));
    }

    for resource in &def.resources {
        validate_resource(resource, &facet_names)?;
    }

    Ok(())
}

/// Validate a resource definition
fn validate_resource(resource: &ResourceDefinition, facets: &HashSet<&str>) -> Result<()> {
    let name = &resource.name;
    if name.is_empty() {
        return Err(Error::config("Resource name cannot be empty"));
    }
    if resource.path.is_empty() {
        return Err(Error::config(format!("Resource '{name}' path cannot be empty")));
    }
    if resource.selector.trim().is_empty() {
        return Err(Error::missing_field(format!("{name}.selector")));
    }
    if resource.max_page_size == Some(0) {
        return Err(Error::invalid_value(
            format!("{name}.max_page_size"),
            "must be greater than zero",
        ));
    }
    if resource.page_size_param.is_some() && resource.max_page_size.is_none() {
        return Err(Error::missing_field(format!("{name}.max_page_size")));
    }

    let blocks = [("backfill", &resource.backfill), ("incremental", &resource.incremental)];
    if blocks.iter().all(|(_, block)| block.is_none()) {
        return Err(Error::config(format!(
            "Resource '{name}' must declare a backfill or incremental block"
        )));
    }

    for (mode, block) in blocks {
        let Some(block) = block else { continue };
        let field = format!("{name}.{mode}");

        for facet in block.pagination.facet_names() {
            if !facets.contains(facet) {
                return Err(Error::invalid_value(
                    format!("{field}.pagination"),
                    format!("unknown facet '{facet}'"),
                ));
            }
        }

        match &block.pagination {
            PaginationDefinition::Facets { dimensions } if dimensions.is_empty() => {
                return Err(Error::invalid_value(
                    format!("{field}.pagination"),
                    "facets pagination needs at least one dimension",
                ));
            }
            PaginationDefinition::DateCursor { .. } if resource.max_page_size.is_none() => {
                return Err(Error::missing_field(format!("{name}.max_page_size")));
            }
            _ => {}
        }

        if block.write_mode == WriteMode::Merge && resource.primary_key.is_empty() {
            return Err(Error::missing_field(format!("{name}.primary_key")));
        }
        if let Some(cursor) = &block.cursor {
            if cursor.path.trim().is_empty() {
                return Err(Error::missing_field(format!("{field}.cursor.path")));
            }
        }
    }

    Ok(())
}
