//! Command-line interface definitions for propdex.
//!
//! Global options (verbosity, color, locations) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Index a graph and remember it
//! propdex sync ~/notes
//!
//! # Query the remembered graph
//! propdex query 'type:book AND has:due' --sort due:desc
//!
//! # Same query as CSV with chosen columns
//! propdex query 'type:book' --output csv --columns page,author
//!
//! # Value distribution of one property
//! propdex analyze --key status
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analysis::DEFAULT_TOP;
use crate::config::SettingsOverrides;
use crate::prefs::SortModelItem;
use crate::scanner::WalkerConfig;

/// Incremental property index for Markdown knowledge-base graphs.
///
/// propdex reads `key:: value` annotations from the blocks of every
/// Markdown file in a graph, caches them per file, and answers flat
/// AND/OR queries over them.
#[derive(Debug, Parser)]
#[command(name = "propdex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Plain progress output without animations
    #[arg(long, global = true, env = "PROPDEX_ACCESSIBLE")]
    pub accessible: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Directory holding the per-graph cache files [default: ./.propdex_cache]
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Preference file [default: ~/.propdex_config.json]
    #[arg(long = "config", global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Location overrides given on the command line.
    #[must_use]
    pub fn settings_overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            cache_dir: self.cache_dir.clone(),
            config_file: self.config_file.clone(),
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bring a graph's cache up to date
    Sync(SyncArgs),
    /// Query block properties
    Query(QueryArgs),
    /// Show property keys or the value distribution of one key
    Analyze(AnalyzeArgs),
    /// Delete every cache file, then clear all preferences
    ClearCache,
    /// Clear remembered columns and sorting
    ClearPrefs(ClearPrefsArgs),
}

/// Options limiting which files belong to a graph.
#[derive(Debug, Clone, Default, Args)]
pub struct WalkArgs {
    /// Skip hidden files and directories
    #[arg(long)]
    pub skip_hidden: bool,

    /// Honor the .gitignore file at the graph root
    #[arg(long)]
    pub gitignore: bool,

    /// Descend into symlinked directories (symlinked files are always read)
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Ignore paths matching a gitignore-style pattern (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,
}

impl WalkArgs {
    /// Walker configuration for these options.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.follow_symlinks,
            self.skip_hidden,
            self.gitignore,
            self.ignore_patterns.clone(),
        )
    }
}

/// Arguments for the sync subcommand.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Graph directory [default: the last synchronized graph]
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Output format for the pass summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for the query subcommand.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query, e.g. 'type:book AND has:due OR status~progress'
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Graph directory [default: the last synchronized graph]
    #[arg(short, long, value_name = "PATH")]
    pub graph: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Columns to show, replacing the remembered selection
    #[arg(long, value_name = "COLS", value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Sort by a column, highest priority first (repeatable)
    #[arg(long = "sort", value_name = "COL[:asc|desc]")]
    pub sort: Vec<SortModelItem>,

    /// Show at most N rows
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for the analyze subcommand.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Graph directory [default: the last synchronized graph]
    #[arg(short, long, value_name = "PATH")]
    pub graph: Option<PathBuf>,

    /// Property key whose values to count
    #[arg(short, long, value_name = "KEY")]
    pub key: Option<String>,

    /// Number of values in the chart
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TOP)]
    pub top: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for the clear-prefs subcommand.
#[derive(Debug, Args)]
pub struct ClearPrefsArgs {
    /// Only clear preferences of this graph
    #[arg(short, long, value_name = "PATH")]
    pub graph: Option<PathBuf>,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned terminal table
    #[default]
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
