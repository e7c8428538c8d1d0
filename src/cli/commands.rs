//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Riksdagen open data harvester
#[derive(Parser, Debug)]
#[command(name = "riksdagen-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source definition: built-in name or YAML file
    #[arg(short, long, global = true, default_value = crate::sources::DEFAULT_SOURCE)]
    pub source: PathBuf,

    /// Output format for command messages
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Date arguments shared by `run` and `facets`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DateArgs {
    /// Window start (YYYY-MM-DD); selects backfill, open-ended without --end-date
    #[arg(long)]
    pub start_date: Option<String>,

    /// Window end (YYYY-MM-DD); alone, the reference date for incremental runs
    #[arg(long)]
    pub end_date: Option<String>,

    /// Backfill without requiring a date window
    #[arg(long)]
    pub full_refresh: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest one resource
    Run {
        /// Resource name, e.g. voteringlista
        resource: String,

        #[command(flatten)]
        dates: DateArgs,

        /// DuckDB database name (file `<name>.duckdb`)
        #[arg(long, env = "DATABASE_NAME", default_value = "riksdagen")]
        database: String,

        /// Write JSON lines to this file instead of DuckDB (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many records
        #[arg(long)]
        max_records: Option<usize>,

        /// Records per sink write
        #[arg(long, default_value = "1000")]
        batch_size: usize,

        /// Resume the incremental cursor from this value
        #[arg(long)]
        cursor_start: Option<String>,
    },

    /// List resources and their pagination strategies
    Resources,

    /// Print the facet combinations a run would visit
    Facets {
        /// Resource name
        resource: String,

        #[command(flatten)]
        dates: DateArgs,
    },

    /// Validate the source definition
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
