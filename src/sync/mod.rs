//! Cache synchronization against the live filesystem.
//!
//! A synchronization pass reconciles a graph's stored [`Cache`] with the
//! Markdown files currently on disk, using modification time as the only
//! change signal:
//!
//! 1. Load the stored cache.
//! 2. Walk the graph for `*.md` files.
//! 3. Classify paths as new, deleted, or potentially modified.
//! 4. Compare live mtimes of the potentially modified set; a file that
//!    cannot be stat'ed anymore counts as deleted.
//! 5. With nothing new, modified or deleted, return without writing.
//! 6. Drop deleted entries; re-extract new and modified files, replacing
//!    their entries entirely.
//! 7. Save and report.
//!
//! Passes are synchronous and single-threaded. Two passes over the same
//! graph must not overlap because both read-modify-write the same cache
//! file; [`GraphLocks`] lets a host serialize them per graph.

pub mod locks;

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{mtime_seconds, Cache, CacheStore, FileCacheEntry};
use crate::progress::{ProgressCallback, PHASE_EXTRACT, PHASE_WALK};
use crate::scanner::path_utils::page_name;
use crate::scanner::{extract_blocks, ScanError, Walker, WalkerConfig};

pub use locks::GraphLocks;

/// How often (in processed files) an info-level progress line is logged.
const LOG_EVERY: usize = 50;

/// Errors that abort a synchronization pass.
///
/// Per-file problems never surface here; they are logged and the file is
/// treated as absent.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// The graph root is missing or is not a directory.
    #[error("Invalid graph root: {0}")]
    InvalidRoot(#[from] ScanError),
}

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    /// Markdown files found on disk
    pub discovered: usize,
    /// Files present on disk but not in the cache
    pub added: usize,
    /// Cached files whose live mtime is newer than the cached one
    pub modified: usize,
    /// Cached files no longer on disk (or no longer readable)
    pub deleted: usize,
    /// Files handed to the property extractor
    pub extracted: usize,
    /// Files that vanished or failed between classification and extraction
    pub skipped: usize,
    /// Cache entries after the pass
    pub entries: usize,
    /// Total blocks across all entries after the pass
    pub blocks: usize,
    /// True when nothing changed and the cache was not rewritten
    pub up_to_date: bool,
    /// Whether the cache file was written successfully (false on the fast path)
    pub saved: bool,
    /// Wall-clock duration of the pass
    pub duration: Duration,
}

/// Change classification computed from the stored cache and the live file set.
#[derive(Debug, Default)]
struct ChangeSet {
    added: BTreeSet<String>,
    modified: BTreeSet<String>,
    deleted: BTreeSet<String>,
}

impl ChangeSet {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    fn to_process(&self) -> impl Iterator<Item = &String> {
        self.added.iter().chain(self.modified.iter())
    }
}

/// Runs synchronization passes against a [`CacheStore`].
pub struct Synchronizer {
    store: CacheStore,
    walker_config: WalkerConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Synchronizer {
    /// Create a synchronizer writing to `store`.
    #[must_use]
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            walker_config: WalkerConfig::default(),
            progress: None,
        }
    }

    /// Use a custom walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Report progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The underlying cache store.
    #[must_use]
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Run one synchronization pass for `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRoot`] when `graph` is not a readable
    /// directory. Every per-file failure is absorbed.
    pub fn sync(&self, graph: &Path) -> Result<SyncSummary, SyncError> {
        let start = Instant::now();
        let walker = Walker::new(graph, self.walker_config.clone());
        walker.validate_root()?;

        let old = self.store.load(graph);

        self.phase_start(PHASE_WALK, 0);
        let current = walker.collect();
        self.phase_end(PHASE_WALK);
        log::debug!(
            "Found {} Markdown files under {}",
            current.len(),
            graph.display()
        );

        let changes = classify(&old, &current);

        let mut summary = SyncSummary {
            discovered: current.len(),
            added: changes.added.len(),
            modified: changes.modified.len(),
            deleted: changes.deleted.len(),
            ..Default::default()
        };

        if changes.is_empty() {
            log::info!("Cache is up to date ({} files)", old.len());
            summary.entries = old.len();
            summary.blocks = old.block_count();
            summary.up_to_date = true;
            summary.duration = start.elapsed();
            return Ok(summary);
        }

        log::info!(
            "Detected {} new, {} modified, {} deleted files",
            changes.added.len(),
            changes.modified.len(),
            changes.deleted.len()
        );

        let mut cache = old;
        for key in &changes.deleted {
            cache.remove(key);
        }

        let total = changes.added.len() + changes.modified.len();
        self.phase_start(PHASE_EXTRACT, total);
        for (index, key) in changes.to_process().enumerate() {
            let processed = index + 1;
            self.progress(processed, key);

            match current.get(key).map(|path| scan_file(path)) {
                Some(Ok(entry)) => {
                    summary.extracted += 1;
                    cache.insert(key.clone(), entry);
                }
                Some(Err(e)) => {
                    if e.kind() == ErrorKind::NotFound {
                        log::debug!("File vanished before extraction: {}", key);
                    } else {
                        log::warn!("Dropping {} from cache: {}", key, e);
                    }
                    summary.skipped += 1;
                    cache.remove(key);
                    self.message(&format!("skipped {key}"));
                }
                None => {
                    summary.skipped += 1;
                    cache.remove(key);
                }
            }

            if processed % LOG_EVERY == 0 {
                log::info!("Updating... [{} / {}]", processed, total);
            }
        }
        self.phase_end(PHASE_EXTRACT);

        summary.saved = self.store.save(graph, &cache);
        summary.entries = cache.len();
        summary.blocks = cache.block_count();
        summary.duration = start.elapsed();

        log::info!(
            "Cache now holds {} files ({} blocks)",
            summary.entries,
            summary.blocks
        );
        Ok(summary)
    }

    fn phase_start(&self, phase: &str, total: usize) {
        if let Some(cb) = &self.progress {
            cb.on_phase_start(phase, total);
        }
    }

    fn phase_end(&self, phase: &str) {
        if let Some(cb) = &self.progress {
            cb.on_phase_end(phase);
        }
    }

    fn message(&self, message: &str) {
        if let Some(cb) = &self.progress {
            cb.on_message(message);
        }
    }

    fn progress(&self, current: usize, key: &str) {
        if let Some(cb) = &self.progress {
            cb.on_progress(current, key);
        }
    }
}

/// Split the live file set against the cache into added, modified and
/// deleted paths.
fn classify(old: &Cache, current: &BTreeMap<String, PathBuf>) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for key in old.paths() {
        if !current.contains_key(key) {
            changes.deleted.insert(key.to_string());
        }
    }

    for (key, path) in current {
        let Some(cached) = old.get(key) else {
            changes.added.insert(key.clone());
            continue;
        };

        match std::fs::metadata(path).and_then(|m| mtime_seconds(&m)) {
            Ok(live) if live > cached.mtime => {
                changes.modified.insert(key.clone());
            }
            Ok(_) => {}
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    log::warn!("Cannot stat {}, treating as deleted: {}", key, e);
                }
                changes.deleted.insert(key.clone());
            }
        }
    }

    changes
}

/// Stat and extract one file.
///
/// The mtime is captured before the content is read so that a write
/// racing with the scan shows up as a newer mtime on the next pass.
/// Content that cannot be read or decoded yields an entry with no
/// blocks; only a failed stat is an error.
fn scan_file(path: &Path) -> std::io::Result<FileCacheEntry> {
    let mtime = mtime_seconds(&std::fs::metadata(path)?)?;

    let blocks = match std::fs::read_to_string(path) {
        Ok(text) => extract_blocks(&page_name(path), &text),
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(e),
        Err(e) => {
            log::debug!("Unreadable file {}, caching no blocks: {}", path.display(), e);
            Vec::new()
        }
    };

    Ok(FileCacheEntry::new(mtime, blocks))
}
