//! Persisted per-graph preferences.
//!
//! One JSON file in the user's home directory remembers, per graph, which
//! result columns are shown and, per graph and query text, how results are
//! sorted. It also remembers the last graph that was synchronized.
//!
//! # Architecture
//!
//! * [`data`]: Serializable models for the preference file.
//! * [`columns`]: Result column discovery and selection merging.
//! * [`store`]: Loading, updating and clearing the preference file.
//!
//! A missing or malformed file is treated as empty; writes replace the
//! whole file and keep keys this version does not understand.

pub mod columns;
pub mod data;
pub mod store;

pub use columns::{reconcile, result_columns, PAGE_COLUMN};
pub use data::{
    sanitize_sort_model, ColumnFilter, PreferenceFile, SortDirection, SortMemory, SortModelItem,
};
pub use store::{graph_key, PreferenceError, PreferenceStore, DEFAULT_PREFERENCE_FILE_NAME};
