//! Per-graph serialization of synchronization passes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::scanner::path_utils::absolute_graph_path;

/// Hands out one mutex per absolute graph path.
///
/// Hosts that run passes on worker threads hold the graph's lock for the
/// duration of a pass. Distinct graphs get distinct locks and never wait
/// on each other. This only coordinates threads of one process.
#[derive(Debug, Default, Clone)]
pub struct GraphLocks {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl GraphLocks {
    /// Create an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `graph`.
    #[must_use]
    pub fn lock_for(&self, graph: &Path) -> Arc<Mutex<()>> {
        let key = absolute_graph_path(graph);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key).or_default())
    }

    /// Run `f` while holding the lock for `graph`.
    ///
    /// A lock poisoned by a panicking pass is recovered: the cache file is
    /// always either the previous or the new complete version.
    pub fn with_graph<T>(&self, graph: &Path, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(graph);
        let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of graphs seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no graph has been locked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
