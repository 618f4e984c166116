//! Path helpers for graph-relative cache keys.
//!
//! Cache entries are keyed by the file's path relative to the graph root.
//! Keys are normalized to NFC with forward slashes so that the same graph
//! produces the same keys on every platform.
//!
//! # Background
//!
//! macOS uses NFD (Decomposed) normalization for file paths, while Windows
//! and Linux typically use NFC (Composed) normalization:
//!
//! - NFC: `café.md` - 'é' is U+00E9 (single code point)
//! - NFD: `café.md` - 'e' U+0065 + combining acute accent U+0301
//!
//! Keys are only used for comparison. The live path returned by the walker
//! is what gets opened, so normalization never breaks file access.

use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
///
/// # Example
///
/// ```
/// use propdex::scanner::path_utils::normalize_path_str;
///
/// let nfd = "cafe\u{0301}.md";
/// assert_eq!(normalize_path_str(nfd), "café.md");
/// ```
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Build the cache key for `path` relative to `root`.
///
/// Returns `None` when `path` is not inside `root`.
#[must_use]
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }

    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Some(normalize_path_str(&joined))
}

/// Resolve a graph path to the absolute form used for cache file naming.
///
/// Relative paths are resolved against the current working directory
/// without touching the filesystem, so a missing graph still maps to a
/// stable name.
#[must_use]
pub fn absolute_graph_path(graph: &Path) -> PathBuf {
    std::path::absolute(graph).unwrap_or_else(|_| graph.to_path_buf())
}

/// Page name for a Markdown file: its file name without extension.
#[must_use]
pub fn page_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| normalize_path_str(&s.to_string_lossy()))
        .unwrap_or_default()
}
