use filetime::{set_file_mtime, FileTime};
use propdex::cache::{CacheError, CacheStore};
use propdex::sync::Synchronizer;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_garbage_cache_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let graph = Path::new("/graphs/notes");
    fs::write(store.cache_file(graph), "not json at all").unwrap();

    assert!(store.load(graph).is_empty());
    assert!(matches!(
        store.try_load(graph),
        Err(CacheError::Malformed { .. })
    ));
}

#[test]
fn test_wrong_shape_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let graph = Path::new("/graphs/notes");
    fs::write(store.cache_file(graph), r#"["a", "b"]"#).unwrap();

    assert!(store.load(graph).is_empty());
}

#[test]
fn test_truncated_cache_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let graph = Path::new("/graphs/notes");
    fs::write(
        store.cache_file(graph),
        r#"{"pages/a.md": {"mtime": 1.0, "blocks": [{"page": "a""#,
    )
    .unwrap();

    assert!(store.load(graph).is_empty());
}

#[test]
fn test_entries_missing_fields_use_defaults() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let graph = Path::new("/graphs/notes");
    fs::write(store.cache_file(graph), r#"{"pages/a.md": {}}"#).unwrap();

    let cache = store.load(graph);
    let entry = cache.get("pages/a.md").unwrap();
    assert_eq!(entry.mtime, 0.0);
    assert!(entry.blocks.is_empty());
}

#[test]
fn test_sync_rebuilds_after_corruption() {
    let graph = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let file = graph.path().join("a.md");
    fs::write(&file, "type:: book\n").unwrap();
    set_file_mtime(&file, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

    let sync = Synchronizer::new(CacheStore::new(cache_dir.path()));
    sync.sync(graph.path()).unwrap();
    fs::write(sync.store().cache_file(graph.path()), "{{{{").unwrap();

    let summary = sync.sync(graph.path()).unwrap();
    assert_eq!(summary.added, 1);
    assert_eq!(summary.extracted, 1);
    assert!(summary.saved);
    assert_eq!(sync.store().load(graph.path()).len(), 1);
}

#[test]
fn test_unwritable_cache_dir_keeps_results_in_memory() {
    let graph = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    fs::write(graph.path().join("a.md"), "type:: book\n").unwrap();

    // A regular file where the cache directory should be
    let blocked = scratch.path().join("cache");
    fs::write(&blocked, "occupied").unwrap();

    let sync = Synchronizer::new(CacheStore::new(&blocked));
    let summary = sync.sync(graph.path()).unwrap();

    assert!(!summary.saved);
    assert_eq!(summary.entries, 1);
    assert_eq!(fs::read_to_string(&blocked).unwrap(), "occupied");
}
