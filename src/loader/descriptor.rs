//! Descriptor construction
//!
//! Turns a validated source definition plus per-run options into the
//! [`ResourceDescriptor`] the engine consumes.

use crate::engine::{PaginationSpec, ResourceDescriptor};
use crate::error::{Error, Result};
use crate::facet::{FacetDimension, FacetSpace};
use crate::http::HttpClientConfig;
use crate::loader::types::{
    ModeDefinition, PaginationDefinition, ResourceDefinition, RunOptions, SourceDefinition,
};
use crate::state::IncrementalCursor;
use crate::template::{render_params, TemplateContext};
use crate::types::HarvestMode;
use std::time::Duration;
use tracing::info;

impl SourceDefinition {
    /// Build the descriptor for `resource` under `options`
    pub fn descriptor(&self, resource: &str, options: &RunOptions) -> Result<ResourceDescriptor> {
        let def = self.resource(resource).ok_or_else(|| Error::UnknownResource {
            name: resource.to_string(),
            available: self.resource_names().join(", "),
        })?;

        let (mode, block) = def.mode(options.mode).ok_or_else(|| {
            Error::config(format!("Resource '{resource}' declares no harvest mode"))
        })?;
        if mode != options.mode {
            info!(
                resource,
                requested = %options.mode,
                using = %mode,
                "Resource has a single mode; using it"
            );
        }

        let cursor = block.cursor.as_ref().map(|c| match &options.cursor_start {
            Some(start) => IncrementalCursor::new(&c.path, start),
            None => c.clone(),
        });

        let mut ctx = TemplateContext::new().with_window(&options.window);
        if let Some(cursor) = &cursor {
            ctx = ctx.with_cursor_start(&cursor.initial_value);
        }

        let mut params = def.params.clone();
        params.extend(block.params.clone());
        let static_params = render_params(&params, &ctx)?;

        let mut descriptor = ResourceDescriptor::new(&def.name, &self.base_url, &def.path, &def.selector)
            .with_pagination(self.pagination_spec(block, options)?)
            .with_write_mode(block.write_mode, def.primary_key.clone());
        descriptor.static_params = static_params;

        if let Some(max) = def.max_page_size {
            descriptor = descriptor.with_page_size(def.page_size_param.as_deref(), max);
        }
        if mode == HarvestMode::Backfill {
            descriptor = descriptor.with_window(options.window);
        }
        if let Some(cursor) = cursor {
            descriptor = descriptor.with_cursor(cursor);
        }
        for field in &def.timestamp_fields {
            descriptor = descriptor.with_timestamp_field(field);
        }

        Ok(descriptor)
    }

    /// A facet dimension by name
    pub fn dimension(&self, name: &str) -> Result<FacetDimension> {
        let facet = self
            .facet(name)
            .ok_or_else(|| Error::invalid_value("facets", format!("unknown facet '{name}'")))?;
        FacetDimension::with_kind(&facet.name, facet.kind, facet.values.clone())
    }

    /// HTTP client configuration for this source
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .max_retries(self.http.max_retries);
        builder = match &self.http.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }

    fn pagination_spec(&self, block: &ModeDefinition, options: &RunOptions) -> Result<PaginationSpec> {
        Ok(match &block.pagination {
            PaginationDefinition::None => PaginationSpec::None,
            PaginationDefinition::NextUrl { path } => PaginationSpec::NextUrl { path: path.clone() },
            PaginationDefinition::Facets { dimensions } => {
                let dims = dimensions
                    .iter()
                    .map(|name| self.dimension(name))
                    .collect::<Result<Vec<_>>>()?;
                PaginationSpec::Facets {
                    space: FacetSpace::new(dims)?,
                }
            }
            PaginationDefinition::LatestFacet {
                outer,
                inner,
                facet_field,
            } => PaginationSpec::LatestFacet {
                outer: self.dimension(outer)?,
                inner: self.dimension(inner)?,
                reference: options.reference_date,
                facet_field: facet_field.clone(),
            },
            PaginationDefinition::DateCursor { param, field } => PaginationSpec::DateCursor {
                param: param.clone(),
                field: field.clone(),
            },
        })
    }
}

impl ResourceDefinition {
    /// Strategy names per declared mode, for listings
    pub fn strategies(&self) -> Vec<(HarvestMode, &'static str)> {
        let mut out = Vec::new();
        if let Some(block) = &self.backfill {
            out.push((HarvestMode::Backfill, strategy_name(&block.pagination)));
        }
        if let Some(block) = &self.incremental {
            out.push((HarvestMode::Incremental, strategy_name(&block.pagination)));
        }
        out
    }
}

fn strategy_name(def: &PaginationDefinition) -> &'static str {
    match def {
        PaginationDefinition::None => "none",
        PaginationDefinition::NextUrl { .. } => "next_url",
        PaginationDefinition::Facets { .. } => "facets",
        PaginationDefinition::LatestFacet { .. } => "latest_facet",
        PaginationDefinition::DateCursor { .. } => "date_cursor",
    }
}
