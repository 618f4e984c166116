//! Markdown file discovery for a graph root.
//!
//! # Overview
//!
//! [`Walker`] enumerates every `*.md` file under a graph root, recursively,
//! and yields it with its graph-relative cache key. Traversal is
//! single-threaded ([`walkdir`]) and sorted by file name so repeated walks
//! over an unchanged tree produce the same order.
//!
//! # Features
//!
//! - Symlinked files are always included; descending into symlinked
//!   directories is optional (walkdir detects cycles)
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file and directory filtering
//!
//! # Example
//!
//! ```no_run
//! use propdex::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/notes"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{} -> {}", file.key, file.path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::path_utils::relative_key;
use super::{MarkdownFile, ScanError, WalkerConfig, MARKDOWN_EXTENSION};

/// Directory walker for Markdown discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given graph root.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Root directory being walked.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the root exists and is a directory.
    pub fn validate_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(e) => Err(ScanError::from_io(&self.root, e)),
        }
    }

    /// Build gitignore matcher from config patterns and .gitignore file.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() && !self.config.respect_gitignore {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);

        if self.config.respect_gitignore {
            let gitignore_path = self.root.join(".gitignore");
            if gitignore_path.exists() {
                if let Some(e) = builder.add(&gitignore_path) {
                    log::warn!(
                        "Failed to load .gitignore from {}: {}",
                        gitignore_path.display(),
                        e
                    );
                } else {
                    log::debug!("Loaded .gitignore from {}", gitignore_path.display());
                }
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Whether a walk entry should be pruned before descending into it.
    fn should_skip(&self, entry: &DirEntry, gitignore: Option<&Gitignore>) -> bool {
        if entry.depth() == 0 {
            return false;
        }

        if self.config.skip_hidden && is_hidden(entry) {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return true;
        }

        if let Some(gi) = gitignore {
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if gi
                .matched_path_or_any_parents(relative, entry.file_type().is_dir())
                .is_ignore()
            {
                log::trace!("Ignoring: {}", entry.path().display());
                return true;
            }
        }

        false
    }

    /// Walk the graph, yielding Markdown files.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<MarkdownFile, ScanError>> + '_ {
        let gitignore = self.build_gitignore();

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.should_skip(entry, gitignore.as_ref()))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.to_markdown_file(&entry).map(Ok),
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    let err = match e.into_io_error() {
                        Some(io) => ScanError::from_io(&path, io),
                        None => ScanError::Loop(path),
                    };
                    Some(Err(err))
                }
            })
    }

    fn to_markdown_file(&self, entry: &DirEntry) -> Option<MarkdownFile> {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some(MARKDOWN_EXTENSION) {
            return None;
        }
        // Links show up here only when not followed. A link to a file
        // counts; a link to a directory is not descended into.
        if file_type.is_symlink() {
            match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    log::trace!("Skipping linked directory: {}", entry.path().display());
                    return None;
                }
                Err(e) => {
                    log::debug!("Skipping broken symlink {}: {}", entry.path().display(), e);
                    return None;
                }
            }
        }

        let key = relative_key(&self.root, entry.path())?;
        Some(MarkdownFile {
            key,
            path: entry.path().to_path_buf(),
        })
    }

    /// Collect the live file set as a mapping from cache key to path.
    ///
    /// Walk errors are logged and skipped; an unreadable subdirectory
    /// simply contributes no files.
    #[must_use]
    pub fn collect(&self) -> BTreeMap<String, PathBuf> {
        let mut files = BTreeMap::new();
        for entry in self.walk() {
            match entry {
                Ok(file) => {
                    if let Some(previous) = files.insert(file.key.clone(), file.path) {
                        log::debug!(
                            "Duplicate cache key {} (also {}), keeping the later path",
                            file.key,
                            previous.display()
                        );
                    }
                }
                Err(e) => log::warn!("Skipping during walk: {}", e),
            }
        }
        files
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
