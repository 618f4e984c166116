//! JSON-file-backed cache store.
//!
//! One file per graph, `<cache dir>/<sha256(absolute graph path)>.json`.
//! Loading never fails: a missing, unreadable or corrupt file is an empty
//! cache. Saving is a best-effort full overwrite; a failure is logged and
//! leaves the previous file in place.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::entry::Cache;
use crate::scanner::path_utils::absolute_graph_path;

/// Default cache directory name, relative to the working directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = ".propdex_cache";

/// Errors from cache file I/O.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("Cache I/O error for {path}: {source}")]
    Io {
        /// Cache file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The cache file does not contain a valid cache.
    #[error("Malformed cache file {path}: {source}")]
    Malformed {
        /// Cache file path
        path: PathBuf,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for fallible cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Location of per-graph cache files.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `dir`. Nothing is created on disk until
    /// the first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file used for `graph`.
    ///
    /// The name is the hex SHA-256 of the absolute graph path string, so
    /// distinct graphs never share a file and no filesystem-unsafe
    /// characters leak into the name.
    #[must_use]
    pub fn cache_file(&self, graph: &Path) -> PathBuf {
        let absolute = absolute_graph_path(graph);
        let mut hasher = Sha256::new();
        hasher.update(absolute.to_string_lossy().as_bytes());
        self.dir.join(format!("{:x}.json", hasher.finalize()))
    }

    /// Load the cache for `graph`, falling back to an empty cache.
    #[must_use]
    pub fn load(&self, graph: &Path) -> Cache {
        match self.try_load(graph) {
            Ok(cache) => cache,
            Err(e) => {
                log::warn!("Ignoring unusable cache, starting empty: {}", e);
                Cache::new()
            }
        }
    }

    /// Load the cache for `graph`, reporting why it could not be read.
    ///
    /// A missing file is not an error and yields an empty cache.
    pub fn try_load(&self, graph: &Path) -> CacheResult<Cache> {
        let path = self.cache_file(graph);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No cache file at {}", path.display());
                return Ok(Cache::new());
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        serde_json::from_str(&content).map_err(|source| CacheError::Malformed { path, source })
    }

    /// Save the cache for `graph`. Returns whether the write succeeded.
    pub fn save(&self, graph: &Path, cache: &Cache) -> bool {
        match self.try_save(graph, cache) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save cache: {}", e);
                false
            }
        }
    }

    /// Save the cache for `graph` as pretty-printed JSON, overwriting the
    /// whole file.
    pub fn try_save(&self, graph: &Path, cache: &Cache) -> CacheResult<()> {
        let path = self.cache_file(graph);
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(cache).map_err(|source| CacheError::Malformed {
            path: path.clone(),
            source,
        })?;

        fs::write(&path, json).map_err(|source| CacheError::Io { path: path.clone(), source })?;
        log::debug!("Saved {} cache entries to {}", cache.len(), path.display());
        Ok(())
    }

    /// Delete the cache directory for every graph.
    ///
    /// An absent directory counts as success.
    pub fn clear(&self) -> bool {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                log::info!("Removed cache directory {}", self.dir.display());
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                log::error!(
                    "Failed to remove cache directory {}: {}",
                    self.dir.display(),
                    e
                );
                false
            }
        }
    }
}
