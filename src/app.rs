//! Command dispatch for the propdex binary.
//!
//! Every command that reads blocks first runs a synchronization pass, so
//! results always reflect the files on disk. Preference failures never
//! fail a query; they are logged and the in-memory state is used.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::{bar_chart, property_keys, value_counts, ValueCount, BAR_WIDTH};
use crate::cache::{Block, CacheStore};
use crate::cli::{
    AnalyzeArgs, ClearPrefsArgs, Cli, Commands, OutputFormat, QueryArgs, SyncArgs, WalkArgs,
};
use crate::config::Settings;
use crate::error::{ExitCode, UsageError};
use crate::output::csv::write_csv_records;
use crate::output::json::{write_json, JsonOutput, JsonQuerySummary, JsonSyncSummary};
use crate::output::text::{sync_report, TextTable};
use crate::output::{apply_sort, build_rows, CsvOutput};
use crate::prefs::{self, data::unique, ColumnFilter, PreferenceStore, SortModelItem};
use crate::progress::Progress;
use crate::query::Query;
use crate::sync::{GraphLocks, SyncSummary, Synchronizer};

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for usage problems ([`UsageError`]) and for failures
/// that prevent the command from completing.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    let settings = Settings::load(&cli.settings_overrides())?;
    let app = App::new(&settings, cli.quiet, cli.accessible);

    match cli.command {
        Commands::Sync(args) => app.sync(args),
        Commands::Query(args) => app.query(args),
        Commands::Analyze(args) => app.analyze(args),
        Commands::ClearCache => app.clear_cache(),
        Commands::ClearPrefs(args) => app.clear_prefs(args),
    }
}

struct App {
    cache: CacheStore,
    prefs: PreferenceStore,
    locks: GraphLocks,
    quiet: bool,
    accessible: bool,
}

impl App {
    fn new(settings: &Settings, quiet: bool, accessible: bool) -> Self {
        Self {
            cache: settings.cache_store(),
            prefs: settings.preference_store(),
            locks: GraphLocks::new(),
            quiet,
            accessible,
        }
    }

    /// The graph given on the command line, else the remembered one.
    fn resolve_graph(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        match path.or_else(|| self.prefs.graph_path()) {
            Some(path) => Ok(path),
            None => Err(UsageError::NoGraph.into()),
        }
    }

    fn run_sync(&self, graph: &Path, walk: &WalkArgs, show_progress: bool) -> Result<SyncSummary> {
        let mut synchronizer =
            Synchronizer::new(self.cache.clone()).with_walker_config(walk.walker_config());
        if show_progress && !self.quiet {
            let progress = Progress::with_accessible(false, self.accessible);
            synchronizer = synchronizer.with_progress(Arc::new(progress));
        }

        let summary = self
            .locks
            .with_graph(graph, || synchronizer.sync(graph))
            .with_context(|| format!("Failed to synchronize {}", graph.display()))?;

        if let Err(e) = self.prefs.set_graph_path(graph) {
            log::warn!("Could not remember graph path: {}", e);
        }
        Ok(summary)
    }

    /// Silent pass followed by loading every cached block.
    fn load_blocks(&self, graph: &Path, walk: &WalkArgs) -> Result<(SyncSummary, Vec<Block>)> {
        let summary = self.run_sync(graph, walk, false)?;
        let blocks = self.cache.load(graph).flatten_blocks();
        log::debug!("Loaded {} blocks from {} files", blocks.len(), summary.entries);
        Ok((summary, blocks))
    }

    fn sync(&self, args: SyncArgs) -> Result<ExitCode> {
        let graph = self.resolve_graph(args.path)?;
        let summary = self.run_sync(&graph, &args.walk, true)?;
        let label = prefs::graph_key(&graph);

        let mut out = io::stdout().lock();
        match args.output {
            OutputFormat::Json => write_json(&JsonSyncSummary::new(&label, &summary), &mut out, true)?,
            OutputFormat::Text | OutputFormat::Csv => {
                if !self.quiet {
                    write!(out, "{}", sync_report(&label, &summary))?;
                }
            }
        }
        Ok(ExitCode::Success)
    }

    fn query(&self, args: QueryArgs) -> Result<ExitCode> {
        let query = Query::parse(&args.query).map_err(UsageError::from)?;
        let graph = self.resolve_graph(args.graph)?;
        let (summary, blocks) = self.load_blocks(&graph, &args.walk)?;

        let matches = query.filter(&blocks);
        log::info!("{} of {} blocks match '{}'", matches.len(), blocks.len(), query);

        let offered = prefs::result_columns(&matches);
        // An empty result only offers `page`; the stored selection is left alone.
        let selection = match (args.columns, matches.is_empty()) {
            (Some(columns), false) => self.explicit_columns(&graph, columns, &offered),
            (None, false) => self.reconciled_columns(&graph, &offered),
            (Some(columns), true) => ColumnFilter::new(clean_columns(columns), offered.clone()),
            (None, true) => prefs::reconcile(&offered, self.prefs.filters(&graph).as_ref()),
        };
        let columns = selection.selected;

        let mut rows = build_rows(&matches);
        apply_sort(&mut rows, &self.sort_model(&graph, &query, args.sort, &columns));
        if let Some(limit) = args.limit {
            rows.truncate(limit);
        }

        let mut out = io::stdout().lock();
        match args.output {
            OutputFormat::Text => {
                if rows.is_empty() {
                    if !self.quiet {
                        writeln!(out, "No blocks match '{query}'")?;
                    }
                } else {
                    write!(out, "{}", TextTable::from_rows(&columns, &rows).render())?;
                    if !self.quiet {
                        writeln!(
                            out,
                            "\n{} of {} blocks match",
                            matches.len(),
                            blocks.len()
                        )?;
                    }
                }
            }
            OutputFormat::Json => {
                let counts = JsonQuerySummary {
                    matches: matches.len(),
                    total_blocks: blocks.len(),
                    entries: summary.entries,
                };
                JsonOutput::new(query.text(), &prefs::graph_key(&graph), counts, &columns, &rows)
                    .write_to(&mut out, true)?;
            }
            OutputFormat::Csv => CsvOutput::new(&columns, &rows).write_to(&mut out)?,
        }

        Ok(if matches.is_empty() {
            ExitCode::NoMatches
        } else {
            ExitCode::Success
        })
    }

    /// `--columns` replaces the selection; everything offered counts as seen.
    fn explicit_columns(&self, graph: &Path, columns: Vec<String>, offered: &[String]) -> ColumnFilter {
        let columns = clean_columns(columns);
        let previous_seen = self.prefs.filters(graph).map(|f| f.seen).unwrap_or_default();
        let seen = unique(previous_seen.into_iter().chain(offered.iter().cloned()).collect());

        self.prefs
            .save_filters(graph, columns.clone(), seen.clone())
            .unwrap_or_else(|e| {
                log::warn!("Could not save column selection: {}", e);
                ColumnFilter::new(columns, seen)
            })
    }

    fn reconciled_columns(&self, graph: &Path, offered: &[String]) -> ColumnFilter {
        self.prefs
            .reconcile_columns(graph, offered)
            .unwrap_or_else(|e| {
                log::warn!("Could not save column selection: {}", e);
                prefs::reconcile(offered, self.prefs.filters(graph).as_ref())
            })
    }

    /// Explicit `--sort` items are numbered in the order given and
    /// remembered for this graph and query; otherwise the remembered model
    /// is used.
    fn sort_model(
        &self,
        graph: &Path,
        query: &Query,
        explicit: Vec<SortModelItem>,
        columns: &[String],
    ) -> Vec<SortModelItem> {
        if explicit.is_empty() {
            return self
                .prefs
                .sort(graph, query.text())
                .map(|memory| memory.sort_model)
                .unwrap_or_default();
        }

        let numbered: Vec<SortModelItem> = explicit
            .into_iter()
            .enumerate()
            .map(|(index, mut item)| {
                item.sort_index = Some(index);
                item
            })
            .collect();

        match self
            .prefs
            .save_sort(graph, query.text(), numbered.clone(), columns.to_vec())
        {
            Ok(memory) => memory.sort_model,
            Err(e) => {
                log::warn!("Could not remember sort order: {}", e);
                prefs::sanitize_sort_model(numbered)
            }
        }
    }

    fn analyze(&self, args: AnalyzeArgs) -> Result<ExitCode> {
        let graph = self.resolve_graph(args.graph)?;
        let (_, blocks) = self.load_blocks(&graph, &args.walk)?;
        let mut out = io::stdout().lock();

        let Some(key) = args.key else {
            let keys = property_keys(&blocks);
            match args.output {
                OutputFormat::Text => write!(out, "{}", TextTable::from_key_counts(&keys).render())?,
                OutputFormat::Json => write_json(&keys, &mut out, true)?,
                OutputFormat::Csv => write_csv_records(&mut out, &keys)?,
            }
            return Ok(if keys.is_empty() {
                ExitCode::NoMatches
            } else {
                ExitCode::Success
            });
        };

        let counts = value_counts(&blocks, &key);
        if counts.is_empty() {
            if !self.quiet {
                writeln!(out, "No block has a '{key}' property")?;
            }
            return Ok(ExitCode::NoMatches);
        }

        match args.output {
            OutputFormat::Text => {
                write!(out, "{}", TextTable::from_value_counts(&key, &counts).render())?;
                writeln!(out)?;
                write!(out, "{}", bar_chart(&counts, args.top, BAR_WIDTH))?;
            }
            OutputFormat::Json => {
                let report = ValueReport {
                    key: &key,
                    values: &counts,
                };
                write_json(&report, &mut out, true)?;
            }
            OutputFormat::Csv => write_csv_records(&mut out, &counts)?,
        }
        Ok(ExitCode::Success)
    }

    fn clear_cache(&self) -> Result<ExitCode> {
        if !self.cache.clear() {
            anyhow::bail!(
                "Failed to delete cache directory {}",
                self.cache.dir().display()
            );
        }
        if let Err(e) = self.prefs.clear(None) {
            log::warn!("Cache deleted, but preferences could not be cleared: {}", e);
        }
        if !self.quiet {
            println!("Cache cleared: {}", self.cache.dir().display());
        }
        Ok(ExitCode::Success)
    }

    fn clear_prefs(&self, args: ClearPrefsArgs) -> Result<ExitCode> {
        self.prefs
            .clear(args.graph.as_deref())
            .context("Failed to clear preferences")?;
        if !self.quiet {
            match &args.graph {
                Some(graph) => println!("Preferences cleared for {}", prefs::graph_key(graph)),
                None => println!("All preferences cleared"),
            }
        }
        Ok(ExitCode::Success)
    }
}

fn clean_columns(columns: Vec<String>) -> Vec<String> {
    columns
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// JSON form of a value distribution.
#[derive(Serialize)]
struct ValueReport<'a> {
    key: &'a str,
    values: &'a [ValueCount],
}
