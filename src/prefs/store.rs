//! Loading and saving the preference file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::prefs::columns;
use crate::prefs::data::{ColumnFilter, PreferenceFile, SortMemory, SortModelItem};
use crate::scanner::path_utils::absolute_graph_path;

/// Default preference file name, placed in the user's home directory.
pub const DEFAULT_PREFERENCE_FILE_NAME: &str = ".propdex_config.json";

/// Errors raised when writing preferences.
#[derive(thiserror::Error, Debug)]
pub enum PreferenceError {
    /// The preference file could not be read or written.
    #[error("I/O error on preference file {path}: {source}")]
    Io {
        /// Preference file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The preferences could not be serialized.
    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The key a graph's preferences are stored under.
#[must_use]
pub fn graph_key(graph: &Path) -> String {
    absolute_graph_path(graph).to_string_lossy().into_owned()
}

/// Preference persistence backed by one JSON file.
///
/// Every mutation loads the current file, applies the change and writes the
/// whole file back, so unrelated keys survive.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Create a store for the file at `path`. Nothing is read yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the preference file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences. A missing or malformed file yields defaults.
    #[must_use]
    pub fn load(&self) -> PreferenceFile {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return PreferenceFile::default(),
            Err(e) => {
                log::warn!(
                    "Failed to read preferences {}, using defaults: {}",
                    self.path.display(),
                    e
                );
                return PreferenceFile::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(
                "Malformed preference file {}, using defaults: {}",
                self.path.display(),
                e
            );
            PreferenceFile::default()
        })
    }

    /// Overwrite the preference file with `prefs`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, prefs: &PreferenceFile) -> Result<(), PreferenceError> {
        let json = serde_json::to_string_pretty(prefs)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        fs::write(&self.path, json).map_err(|source| self.io_error(source))?;
        log::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }

    fn update<T>(&self, f: impl FnOnce(&mut PreferenceFile) -> T) -> Result<T, PreferenceError> {
        let mut prefs = self.load();
        let out = f(&mut prefs);
        self.save(&prefs)?;
        Ok(out)
    }

    fn io_error(&self, source: io::Error) -> PreferenceError {
        PreferenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// The last remembered graph path.
    #[must_use]
    pub fn graph_path(&self) -> Option<PathBuf> {
        self.load()
            .graph_path
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Remember `graph` as the last synchronized graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn set_graph_path(&self, graph: &Path) -> Result<(), PreferenceError> {
        let key = graph_key(graph);
        self.update(|prefs| prefs.graph_path = Some(key))
    }

    /// Stored column selection for `graph`.
    #[must_use]
    pub fn filters(&self, graph: &Path) -> Option<ColumnFilter> {
        self.load().column_filters.remove(&graph_key(graph))
    }

    /// Store a column selection for `graph`. Lists are de-duplicated and
    /// the entry is timestamped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_filters(
        &self,
        graph: &Path,
        selected: Vec<String>,
        seen: Vec<String>,
    ) -> Result<ColumnFilter, PreferenceError> {
        let filter = ColumnFilter::new(selected, seen);
        let key = graph_key(graph);
        self.update(|prefs| {
            prefs.column_filters.insert(key, filter.clone());
            filter
        })
    }

    /// Merge the columns of a result set into the stored selection for
    /// `graph` and store the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn reconcile_columns(
        &self,
        graph: &Path,
        columns: &[String],
    ) -> Result<ColumnFilter, PreferenceError> {
        let key = graph_key(graph);
        self.update(|prefs| {
            let merged = columns::reconcile(columns, prefs.column_filters.get(&key));
            prefs.column_filters.insert(key, merged.clone());
            merged
        })
    }

    /// Stored sort memory for `query` on `graph`.
    #[must_use]
    pub fn sort(&self, graph: &Path, query: &str) -> Option<SortMemory> {
        self.load()
            .query_sort_memory
            .remove(&graph_key(graph))
            .and_then(|mut per_query| per_query.remove(query))
    }

    /// Store sort memory for `query` on `graph`. The model is sanitized.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_sort(
        &self,
        graph: &Path,
        query: &str,
        sort_model: Vec<SortModelItem>,
        column_order: Vec<String>,
    ) -> Result<SortMemory, PreferenceError> {
        let memory = SortMemory::new(sort_model, column_order);
        let key = graph_key(graph);
        self.update(|prefs| {
            prefs
                .query_sort_memory
                .entry(key)
                .or_default()
                .insert(query.to_string(), memory.clone());
            memory
        })
    }

    /// Clear column selections and sort memory for one graph, or for all
    /// graphs when `graph` is `None`. The remembered graph path is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn clear(&self, graph: Option<&Path>) -> Result<(), PreferenceError> {
        self.update(|prefs| match graph {
            Some(graph) => {
                let key = graph_key(graph);
                prefs.column_filters.remove(&key);
                prefs.query_sort_memory.remove(&key);
            }
            None => {
                prefs.column_filters.clear();
                prefs.query_sort_memory.clear();
            }
        })
    }
}
