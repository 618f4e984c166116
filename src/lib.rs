//! propdex - Incremental Property Index for Markdown Graphs
//!
//! Reads `key:: value` annotations from the blocks of every Markdown file in
//! a knowledge-base graph, keeps them in a per-graph JSON cache that is
//! refreshed incrementally by modification time, and answers flat AND/OR
//! property queries.
//!
//! # Architecture
//!
//! * [`scanner`]: Graph walking and property extraction.
//! * [`cache`]: Cache data model and the on-disk cache store.
//! * [`sync`]: Incremental synchronization of a cache with the filesystem.
//! * [`query`]: Query parsing and evaluation.
//! * [`prefs`]: Persisted column selections and sort memory.
//! * [`analysis`]: Property key and value statistics.
//! * [`output`]: Text, JSON and CSV rendering.

pub mod analysis;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod prefs;
pub mod progress;
pub mod query;
pub mod scanner;
pub mod sync;

pub use app::run_app;
