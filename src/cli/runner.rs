//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, DateArgs, OutputFormat};
use crate::engine::{
    HarvestConfig, HarvestStats, Harvester, PaginationController, PaginationSpec,
    ResourceDescriptor,
};
use crate::error::Result;
use crate::facet::{DateWindowFilter, WindowMatch};
use crate::http::HttpClient;
use crate::loader::{load_source, RunOptions, SourceDefinition};
use crate::pagination::LatestFacetPaginator;
use crate::sink::{DuckDbSink, JsonLinesSink, RecordSink};
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                resource,
                dates,
                database,
                output,
                max_records,
                batch_size,
                cursor_start,
            } => {
                let mut options = run_options(dates)?;
                if let Some(start) = cursor_start {
                    options = options.with_cursor_start(start);
                }
                let mut config = HarvestConfig::new().with_batch_size(*batch_size);
                if let Some(max) = max_records {
                    config = config.with_max_records(*max);
                }
                self.harvest(resource, &options, database, output.as_deref(), config)
                    .await
            }
            Commands::Resources => self.resources(),
            Commands::Facets { resource, dates } => self.facets(resource, dates),
            Commands::Validate => self.validate(),
        }
    }

    /// Load the source definition
    fn load_source(&self) -> Result<SourceDefinition> {
        load_source(&self.cli.source)
    }

    /// Harvest one resource into DuckDB or a JSON-lines file
    async fn harvest(
        &self,
        resource: &str,
        options: &RunOptions,
        database: &str,
        output: Option<&Path>,
        config: HarvestConfig,
    ) -> Result<()> {
        let source = self.load_source()?;
        let descriptor = source.descriptor(resource, options)?;
        let client = HttpClient::with_config(source.http_config())?;
        let controller = PaginationController::new(descriptor, client)?;

        info!(
            resource,
            mode = %options.mode,
            strategy = controller.strategy(),
            "Resolved harvest plan"
        );

        let to_stdout = output.is_some_and(|p| p.as_os_str() == "-");
        let mut sink: Box<dyn RecordSink> = match output {
            Some(_) if to_stdout => Box::new(JsonLinesSink::stdout()),
            Some(path) => Box::new(JsonLinesSink::file(path)),
            None => Box::new(DuckDbSink::for_database(database)),
        };

        let mut harvester = Harvester::new(controller).with_config(config);
        let stats = harvester.run(sink.as_mut()).await?;

        // Keep stdout clean when it carries the records
        if !to_stdout {
            self.output_message(&summary_message(resource, options, &stats));
        }
        Ok(())
    }

    /// List resources
    fn resources(&self) -> Result<()> {
        let source = self.load_source()?;
        let resources: Vec<Value> = source
            .resources
            .iter()
            .map(|r| {
                let modes: serde_json::Map<String, Value> = r
                    .strategies()
                    .into_iter()
                    .map(|(mode, strategy)| (mode.to_string(), json!(strategy)))
                    .collect();
                json!({
                    "name": r.name,
                    "description": r.description,
                    "path": r.path,
                    "primary_key": r.primary_key,
                    "modes": modes,
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "RESOURCES",
            "source": source.name,
            "resources": resources,
        }));
        Ok(())
    }

    /// Dry run: the facet combinations a run would request
    fn facets(&self, resource: &str, dates: &DateArgs) -> Result<()> {
        let source = self.load_source()?;
        let options = run_options(dates)?;
        let descriptor = source.descriptor(resource, &options)?;

        let (window_match, combinations) = plan_facets(&descriptor)?;
        self.output_message(&json!({
            "type": "FACETS",
            "resource": resource,
            "mode": options.mode.to_string(),
            "strategy": descriptor.pagination.kind(),
            "window": window_label(window_match),
            "count": combinations.len(),
            "combinations": combinations,
        }));
        Ok(())
    }

    /// Validate the source definition
    fn validate(&self) -> Result<()> {
        let source = self.load_source()?;
        self.output_message(&json!({
            "type": "VALIDATION",
            "source": source.name,
            "version": source.version,
            "resources": source.resource_names(),
            "valid": true,
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn run_options(dates: &DateArgs) -> Result<RunOptions> {
    RunOptions::from_dates(
        dates.start_date.as_deref(),
        dates.end_date.as_deref(),
        dates.full_refresh,
    )
}

/// Facet parameter sets in visiting order
pub(crate) fn plan_facets(descriptor: &ResourceDescriptor) -> Result<(WindowMatch, Vec<Value>)> {
    match &descriptor.pagination {
        PaginationSpec::Facets { space } => {
            let (narrowed, window_match) =
                DateWindowFilter::filter_with_match(space, &descriptor.date_window);
            let combos = narrowed
                .combinations()
                .map(|c| json!(c.to_params()))
                .collect();
            Ok((window_match, combos))
        }
        PaginationSpec::LatestFacet {
            outer,
            inner,
            reference,
            ..
        } => {
            let paginator = LatestFacetPaginator::from_reference(outer, inner.clone(), *reference)?;
            let combos = inner
                .values()
                .iter()
                .map(|value| {
                    let mut params = serde_json::Map::new();
                    params.insert(outer.name().to_string(), json!(paginator.derived()));
                    params.insert(inner.name().to_string(), json!(value));
                    Value::Object(params)
                })
                .collect();
            Ok((WindowMatch::Unfiltered, combos))
        }
        _ => Ok((WindowMatch::Unfiltered, Vec::new())),
    }
}

fn window_label(window_match: WindowMatch) -> Value {
    match window_match {
        WindowMatch::Unfiltered => json!("unfiltered"),
        WindowMatch::Narrowed { kept, total } => json!({ "kept": kept, "total": total }),
        WindowMatch::FellBack => json!("fell_back"),
    }
}

fn summary_message(resource: &str, options: &RunOptions, stats: &HarvestStats) -> Value {
    json!({
        "type": "HARVEST_SUMMARY",
        "resource": resource,
        "mode": options.mode.to_string(),
        "records": stats.records,
        "pages": stats.pages,
        "filtered": stats.filtered,
        "unreadable_cursor": stats.unreadable_cursor,
        "stop_reason": stats.stop_reason.as_ref().map(ToString::to_string),
        "final_cursor": stats.final_cursor,
        "truncated": stats.truncated(),
        "duration_ms": stats.duration_ms,
    })
}
