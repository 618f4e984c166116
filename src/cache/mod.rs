//! Incremental cache for extracted properties.
//!
//! This module provides persistent storage for per-file extraction
//! results so that a graph only re-parses files that changed since the
//! previous synchronization pass.
//!
//! # Architecture
//!
//! The caching system is split into two main components:
//!
//! * [`store`]: JSON file persistence, one file per graph.
//! * [`entry`]: The data model stored in the cache (blocks, file entries).
//!
//! # Cache Invalidation
//!
//! Entries are keyed by graph-relative path and validated by modification
//! time only. A file whose live mtime is strictly greater than the cached
//! one is re-extracted; content is never hashed.

pub mod entry;
pub mod store;

pub use entry::{mtime_seconds, system_time_seconds, Block, Cache, FileCacheEntry, Properties};
pub use store::{CacheError, CacheResult, CacheStore, DEFAULT_CACHE_DIR_NAME};
