use filetime::{set_file_mtime, FileTime};
use propdex::cache::CacheStore;
use propdex::scanner::WalkerConfig;
use propdex::sync::Synchronizer;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BOOK: &str = "- Dune\n  type:: book\n  due:: 2024-01-01\n- no properties here\n";
const ARTICLE: &str = "title:: Weekly\n- Rust news\n  type:: article\n";

fn write(root: &Path, rel: &str, text: &str, mtime: i64) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
}

fn setup() -> (TempDir, TempDir, Synchronizer) {
    let graph = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(graph.path(), "pages/book.md", BOOK, 1_700_000_000);
    write(graph.path(), "journals/2024_01_01.md", ARTICLE, 1_700_000_000);
    let sync = Synchronizer::new(CacheStore::new(cache.path()));
    (graph, cache, sync)
}

#[test]
fn test_first_pass_extracts_everything() {
    let (graph, _cache, sync) = setup();
    let summary = sync.sync(graph.path()).unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.added, 2);
    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.entries, 2);
    // book: one block with properties; article: preamble + one block
    assert_eq!(summary.blocks, 3);
    assert!(summary.saved);
    assert!(!summary.up_to_date);
}

#[test]
fn test_second_pass_is_a_no_op() {
    let (graph, _cache, sync) = setup();
    sync.sync(graph.path()).unwrap();
    let cache_file = sync.store().cache_file(graph.path());
    let before = fs::read_to_string(&cache_file).unwrap();

    let summary = sync.sync(graph.path()).unwrap();

    assert!(summary.up_to_date);
    assert_eq!(summary.extracted, 0);
    assert_eq!(summary.entries, 2);
    assert!(!summary.saved);
    assert_eq!(fs::read_to_string(&cache_file).unwrap(), before);
}

#[test]
fn test_touching_one_file_reextracts_only_it() {
    let (graph, _cache, sync) = setup();
    sync.sync(graph.path()).unwrap();
    let before = sync.store().load(graph.path());

    write(
        graph.path(),
        "pages/book.md",
        "- Dune\n  type:: novel\n",
        1_700_000_100,
    );
    let summary = sync.sync(graph.path()).unwrap();

    assert_eq!(summary.modified, 1);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.entries, 2);

    let after = sync.store().load(graph.path());
    assert_eq!(
        after.get("journals/2024_01_01.md"),
        before.get("journals/2024_01_01.md")
    );
    let book = after.get("pages/book.md").unwrap();
    assert_eq!(book.blocks.len(), 1);
    assert_eq!(book.blocks[0].properties["type"], "novel");
    assert!(!book.blocks[0].properties.contains_key("due"));
    assert_eq!(book.mtime, 1_700_000_100.0);
}

#[test]
fn test_older_mtime_is_not_a_change() {
    let (graph, _cache, sync) = setup();
    sync.sync(graph.path()).unwrap();

    write(graph.path(), "pages/book.md", "- changed\n  type:: x\n", 1_600_000_000);
    let summary = sync.sync(graph.path()).unwrap();

    assert!(summary.up_to_date);
    let cache = sync.store().load(graph.path());
    assert_eq!(cache.get("pages/book.md").unwrap().blocks[0].properties["type"], "book");
}

#[test]
fn test_deleted_file_drops_its_entry() {
    let (graph, _cache, sync) = setup();
    sync.sync(graph.path()).unwrap();

    fs::remove_file(graph.path().join("pages/book.md")).unwrap();
    let summary = sync.sync(graph.path()).unwrap();

    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.extracted, 0);
    assert_eq!(summary.entries, 1);
    assert!(summary.saved);
    assert!(!sync.store().load(graph.path()).contains("pages/book.md"));
}

#[test]
fn test_new_file_is_added() {
    let (graph, _cache, sync) = setup();
    sync.sync(graph.path()).unwrap();

    write(graph.path(), "pages/new.md", "status:: draft\n", 1_700_000_000);
    let summary = sync.sync(graph.path()).unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.entries, 3);
}

#[test]
fn test_non_markdown_files_are_ignored() {
    let (graph, _cache, sync) = setup();
    write(graph.path(), "assets/image.png", "type:: image", 1_700_000_000);
    write(graph.path(), "pages/notes.txt", "type:: text", 1_700_000_000);
    write(graph.path(), "pages/upper.MD", "type:: upper", 1_700_000_000);

    let summary = sync.sync(graph.path()).unwrap();
    assert_eq!(summary.discovered, 2);
}

#[test]
fn test_file_without_properties_is_cached_empty() {
    let (graph, _cache, sync) = setup();
    write(graph.path(), "pages/plain.md", "- just text\n- more text\n", 1_700_000_000);

    sync.sync(graph.path()).unwrap();
    let cache = sync.store().load(graph.path());
    let entry = cache.get("pages/plain.md").unwrap();
    assert!(entry.blocks.is_empty());
}

#[test]
fn test_invalid_utf8_contributes_no_blocks() {
    let (graph, _cache, sync) = setup();
    let path = graph.path().join("pages/binary.md");
    fs::write(&path, [0xff, 0xfe, b't', b'y', b'p', b'e', b':', b':', b' ', b'x']).unwrap();

    let summary = sync.sync(graph.path()).unwrap();
    assert_eq!(summary.entries, 3);
    let cache = sync.store().load(graph.path());
    assert!(cache.get("pages/binary.md").unwrap().blocks.is_empty());
}

#[test]
fn test_missing_root_is_an_error() {
    let cache = TempDir::new().unwrap();
    let sync = Synchronizer::new(CacheStore::new(cache.path()));
    assert!(sync.sync(Path::new("/definitely/not/a/graph")).is_err());
}

#[test]
fn test_ignore_patterns_limit_the_graph() {
    let (graph, _cache, _) = setup();
    let cache = TempDir::new().unwrap();
    let sync = Synchronizer::new(CacheStore::new(cache.path())).with_walker_config(
        WalkerConfig::new(false, false, false, vec!["journals/".to_string()]),
    );

    let summary = sync.sync(graph.path()).unwrap();
    assert_eq!(summary.discovered, 1);
    assert!(sync.store().load(graph.path()).contains("pages/book.md"));
}

#[test]
fn test_distinct_graphs_use_distinct_cache_files() {
    let (graph_a, cache, sync) = setup();
    let graph_b = TempDir::new().unwrap();
    write(graph_b.path(), "only.md", "k:: v\n", 1_700_000_000);

    sync.sync(graph_a.path()).unwrap();
    sync.sync(graph_b.path()).unwrap();

    let files = fs::read_dir(cache.path()).unwrap().count();
    assert_eq!(files, 2);
    assert_eq!(sync.store().load(graph_b.path()).len(), 1);
    assert_eq!(sync.store().load(graph_a.path()).len(), 2);
}

/// Deterministic sub-second offsets spread over the whole nanosecond range.
fn nanos_sequence(count: usize) -> Vec<u32> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            u32::try_from((state >> 33) % 1_000_000_000).unwrap()
        })
        .collect()
}

#[test]
fn test_sub_second_mtimes_survive_the_cache() {
    let graph = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    for (i, nanos) in nanos_sequence(500).into_iter().enumerate() {
        let path = graph.path().join(format!("pages/note_{i:04}.md"));
        if i == 0 {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
        }
        fs::write(&path, format!("- note {i}\n  index:: {i}\n")).unwrap();
        let secs = 1_760_000_000 + i64::try_from(i).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(secs, nanos)).unwrap();
    }
    let sync = Synchronizer::new(CacheStore::new(cache.path()));

    let first = sync.sync(graph.path()).unwrap();
    assert_eq!(first.extracted, 500);

    let second = sync.sync(graph.path()).unwrap();
    assert!(second.up_to_date);
    assert_eq!(second.modified, 0);
    assert_eq!(second.extracted, 0);
    assert_eq!(second.entries, 500);
}

#[cfg(unix)]
#[test]
fn test_symlinked_markdown_file_is_part_of_the_graph() {
    let graph = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(graph.path(), "local.md", BOOK, 1_700_000_000);
    write(outside.path(), "shared.md", ARTICLE, 1_700_000_000);
    std::os::unix::fs::symlink(outside.path().join("shared.md"), graph.path().join("shared.md"))
        .unwrap();

    let sync = Synchronizer::new(CacheStore::new(cache.path()));
    let summary = sync.sync(graph.path()).unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.entries, 2);
    let cached = sync.store().load(graph.path());
    assert!(cached.contains("shared.md"));

    // The link's target mtime is what gets cached, so a second pass is a no-op
    assert!(sync.sync(graph.path()).unwrap().up_to_date);
}
