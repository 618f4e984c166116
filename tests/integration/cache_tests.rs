use propdex::cache::{Block, Cache, CacheStore, FileCacheEntry, Properties};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn sample_cache() -> Cache {
    let mut props = Properties::new();
    props.insert("type".to_string(), "book".to_string());
    props.insert("due".to_string(), "2024-01-01".to_string());

    let mut cache = Cache::new();
    cache.insert(
        "pages/book.md",
        FileCacheEntry::new(
            1_700_000_000.25,
            vec![Block::new("book", "- Dune\n  type:: book\n  due:: 2024-01-01", props)],
        ),
    );
    cache.insert("pages/empty.md", FileCacheEntry::new(1_700_000_001.0, Vec::new()));
    cache
}

#[test]
fn test_save_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path().join("cache"));
    let graph = Path::new("/graphs/notes");
    let cache = sample_cache();

    assert!(store.save(graph, &cache));
    let loaded = store.load(graph);

    assert_eq!(loaded, cache);
    assert_eq!(loaded.flatten_blocks(), cache.flatten_blocks());
}

#[test]
fn test_cache_file_is_named_by_sha256_of_absolute_path() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let graph = Path::new("/graphs/notes");

    let expected = format!("{:x}.json", Sha256::digest("/graphs/notes".as_bytes()));
    let file = store.cache_file(graph);

    assert_eq!(file.file_name().unwrap().to_str().unwrap(), expected);
    assert_eq!(file.parent().unwrap(), dir.path());
}

#[test]
fn test_file_format() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let graph = Path::new("/graphs/notes");
    store.save(graph, &sample_cache());

    let text = fs::read_to_string(store.cache_file(graph)).unwrap();
    assert!(text.contains('\n'), "cache file should be pretty-printed");

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let entry = &value["pages/book.md"];
    assert_eq!(entry["mtime"], 1_700_000_000.25);
    assert_eq!(entry["blocks"][0]["page"], "book");
    assert_eq!(entry["blocks"][0]["properties"]["type"], "book");
    assert!(entry["blocks"][0]["content"].as_str().unwrap().starts_with("- Dune"));
}

#[test]
fn test_missing_cache_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path().join("never-created"));
    assert!(store.load(Path::new("/graphs/notes")).is_empty());
}

#[test]
fn test_clear_removes_directory() {
    let dir = TempDir::new().unwrap();
    let cache_dir = dir.path().join("cache");
    let store = CacheStore::new(&cache_dir);
    store.save(Path::new("/a"), &sample_cache());
    store.save(Path::new("/b"), &sample_cache());

    assert!(store.clear());
    assert!(!cache_dir.exists());
    assert!(store.load(Path::new("/a")).is_empty());
    // Already gone
    assert!(store.clear());
}

#[test]
fn test_save_overwrites_previous_version() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let graph = Path::new("/graphs/notes");

    store.save(graph, &sample_cache());
    let mut smaller = sample_cache();
    smaller.remove("pages/book.md");
    store.save(graph, &smaller);

    let loaded = store.load(graph);
    assert_eq!(loaded.len(), 1);
    assert!(loaded.contains("pages/empty.md"));
}

#[test]
fn test_flatten_follows_cache_order() {
    let mut cache = sample_cache();
    let mut props = Properties::new();
    props.insert("k".to_string(), "v".to_string());
    cache.insert(
        "a.md",
        FileCacheEntry::new(1.0, vec![Block::new("a", "k:: v", props)]),
    );

    let pages: Vec<String> = cache.flatten_blocks().into_iter().map(|b| b.page).collect();
    assert_eq!(pages, vec!["a", "book"]);
}

#[test]
fn test_sub_second_mtimes_round_trip_exactly() {
    use propdex::cache::system_time_seconds;
    use std::time::{Duration, UNIX_EPOCH};

    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path().join("cache"));
    let graph = Path::new("/graphs/notes");

    let mut cache = Cache::new();
    let mut nanos: u32 = 123_456_789;
    for i in 0..300u64 {
        nanos = nanos.wrapping_mul(1_103_515_245).wrapping_add(12_345) % 1_000_000_000;
        let mtime = system_time_seconds(UNIX_EPOCH + Duration::new(1_760_000_000 + i, nanos));
        cache.insert(format!("pages/{i}.md"), FileCacheEntry::new(mtime, Vec::new()));
    }

    assert!(store.save(graph, &cache));
    let loaded = store.load(graph);
    for (key, entry) in cache.iter() {
        assert_eq!(
            loaded.get(key).unwrap().mtime.to_bits(),
            entry.mtime.to_bits(),
            "mtime of {key} changed"
        );
    }
}
