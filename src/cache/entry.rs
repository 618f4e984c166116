//! Cache entry definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

/// Property mapping of one block, keyed by property name.
pub type Properties = BTreeMap<String, String>;

/// One property-bearing unit of text.
///
/// Blocks are immutable once extracted: a changed file produces a fresh
/// set of blocks that replaces the old set wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Source page: the file name without its extension
    pub page: String,
    /// Raw block text, property lines included
    pub content: String,
    /// Extracted `key:: value` pairs
    pub properties: Properties,
}

impl Block {
    /// Create a new block.
    #[must_use]
    pub fn new(page: impl Into<String>, content: impl Into<String>, properties: Properties) -> Self {
        Self {
            page: page.into(),
            content: content.into(),
            properties,
        }
    }
}

/// Cached state of a single Markdown file.
///
/// The graph-relative path is the key of this entry inside [`Cache`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCacheEntry {
    /// Modification time in seconds since the Unix epoch, read when the
    /// file was scanned.
    #[serde(default)]
    pub mtime: f64,
    /// Blocks with at least one property, in file order
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl FileCacheEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(mtime: f64, blocks: Vec<Block>) -> Self {
        Self { mtime, blocks }
    }
}

/// Per-graph mapping from relative path to [`FileCacheEntry`].
///
/// Serialized transparently as a JSON object:
///
/// ```json
/// {
///   "pages/books.md": {
///     "mtime": 1704067200.5,
///     "blocks": [{ "page": "books", "content": "- Dune\n  type:: book", "properties": { "type": "book" } }]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cache {
    entries: BTreeMap<String, FileCacheEntry>,
}

impl Cache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of file entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up one file's entry.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FileCacheEntry> {
        self.entries.get(path)
    }

    /// Whether `path` has an entry.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or replace the entry for `path`.
    pub fn insert(&mut self, path: impl Into<String>, entry: FileCacheEntry) -> Option<FileCacheEntry> {
        self.entries.insert(path.into(), entry)
    }

    /// Remove the entry for `path`.
    pub fn remove(&mut self, path: &str) -> Option<FileCacheEntry> {
        self.entries.remove(path)
    }

    /// Iterate over cached paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over `(path, entry)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileCacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Total number of blocks across all entries.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.entries.values().map(|e| e.blocks.len()).sum()
    }

    /// Concatenate every entry's blocks in cache iteration order.
    #[must_use]
    pub fn flatten_blocks(&self) -> Vec<Block> {
        self.entries
            .values()
            .flat_map(|entry| entry.blocks.iter().cloned())
            .collect()
    }
}

/// Modification time of a file as floating-point seconds since the epoch.
///
/// Times before the epoch come out negative rather than failing.
pub fn mtime_seconds(metadata: &Metadata) -> std::io::Result<f64> {
    Ok(system_time_seconds(metadata.modified()?))
}

/// Convert a [`SystemTime`] to floating-point seconds since the epoch.
#[must_use]
pub fn system_time_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}
