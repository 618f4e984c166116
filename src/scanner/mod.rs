//! Scanner module for graph traversal and property extraction.
//!
//! This module provides functionality for:
//! - Discovering Markdown files under a graph root
//! - Extracting `key:: value` properties from file text
//! - Normalizing graph-relative paths into cache keys
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and Markdown discovery
//! - [`properties`]: Block splitting and property extraction
//! - [`path_utils`]: Cache key and page name helpers
//!
//! # Example
//!
//! ```no_run
//! use propdex::scanner::{extract_blocks, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for (key, path) in walker.collect() {
//!     let text = std::fs::read_to_string(&path).unwrap_or_default();
//!     let blocks = extract_blocks("page", &text);
//!     println!("{}: {} blocks", key, blocks.len());
//! }
//! ```

pub mod path_utils;
pub mod properties;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use properties::{extract_blocks, parse_properties, parse_property_line, split_blocks};
pub use walker::Walker;

/// Extension (without dot) of files that belong to a graph.
pub const MARKDOWN_EXTENSION: &str = "md";

/// A Markdown file discovered under a graph root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownFile {
    /// Graph-relative, NFC-normalized path with forward slashes
    pub key: String,
    /// Live path on disk
    pub path: PathBuf,
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into symlinked directories. Symlinked files are always
    /// included.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Also honor a `.gitignore` file at the graph root.
    pub respect_gitignore: bool,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Create a new configuration from CLI arguments.
    #[must_use]
    pub fn new(
        follow_symlinks: bool,
        skip_hidden: bool,
        respect_gitignore: bool,
        ignore_patterns: Vec<String>,
    ) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            respect_gitignore,
            ignore_patterns,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A symbolic link cycle was detected.
    #[error("Symlink loop detected at {0}")]
    Loop(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
