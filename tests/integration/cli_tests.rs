use clap::Parser;
use propdex::cli::Cli;
use propdex::error::{exit_code_for, ExitCode, UsageError};
use propdex::prefs::PreferenceStore;
use propdex::run_app;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A graph plus private cache and preference locations.
struct Env {
    graph: TempDir,
    state: TempDir,
}

impl Env {
    fn new() -> Self {
        let env = Self {
            graph: TempDir::new().unwrap(),
            state: TempDir::new().unwrap(),
        };
        env.write("pages/first.md", "- Dune\n  type:: book\n  due:: 2024-01-01\n");
        env.write("pages/second.md", "- Rust news\n  type:: article\n");
        env
    }

    fn write(&self, rel: &str, text: &str) {
        let path = self.graph.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn cache_dir(&self) -> PathBuf {
        self.state.path().join("cache")
    }

    fn prefs_file(&self) -> PathBuf {
        self.state.path().join("prefs.json")
    }

    fn graph_arg(&self) -> String {
        self.graph.path().to_string_lossy().into_owned()
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let cache_dir = self.cache_dir().to_string_lossy().into_owned();
        let prefs = self.prefs_file().to_string_lossy().into_owned();
        let mut argv = vec![
            "propdex",
            "-q",
            "--no-color",
            "--cache-dir",
            cache_dir.as_str(),
            "--config",
            prefs.as_str(),
        ];
        argv.extend_from_slice(args);
        run_app(Cli::try_parse_from(argv).unwrap())
    }

    fn prefs(&self) -> PreferenceStore {
        PreferenceStore::new(self.prefs_file())
    }
}

#[test]
fn test_sync_remembers_graph() {
    let env = Env::new();
    let graph = env.graph_arg();

    assert_eq!(env.run(&["sync", &graph]).unwrap(), ExitCode::Success);
    assert!(env.cache_dir().is_dir());
    assert_eq!(env.prefs().graph_path(), Some(PathBuf::from(&graph)));

    // Later commands fall back to the remembered graph
    assert_eq!(env.run(&["query", "type:book"]).unwrap(), ExitCode::Success);
}

#[test]
fn test_query_exit_codes() {
    let env = Env::new();
    let graph = env.graph_arg();

    assert_eq!(
        env.run(&["query", "type:book", "--graph", &graph]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(
        env.run(&["query", "type:magazine", "--graph", &graph]).unwrap(),
        ExitCode::NoMatches
    );
}

#[test]
fn test_empty_query_is_a_usage_error() {
    let env = Env::new();
    let graph = env.graph_arg();

    let err = env.run(&["query", "   ", "--graph", &graph]).unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::UsageError);
    // Rejected before any synchronization
    assert!(!env.cache_dir().exists());
}

#[test]
fn test_missing_graph_is_a_usage_error() {
    let env = Env::new();
    let err = env.run(&["query", "has:type"]).unwrap_err();
    assert_eq!(err.downcast_ref::<UsageError>(), Some(&UsageError::NoGraph));
    assert_eq!(exit_code_for(&err), ExitCode::UsageError);
}

#[test]
fn test_nonexistent_graph_is_a_general_error() {
    let env = Env::new();
    let missing = env.state.path().join("nope");
    let err = env
        .run(&["sync", missing.to_str().unwrap()])
        .unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::GeneralError);
}

#[test]
fn test_query_updates_column_preferences() {
    let env = Env::new();
    let graph = env.graph_arg();

    env.run(&["query", "has:type", "--graph", &graph, "--output", "json"])
        .unwrap();
    let filters = env.prefs().filters(Path::new(&graph)).unwrap();
    assert_eq!(filters.selected, vec!["page", "due", "type"]);

    env.run(&[
        "query",
        "has:type",
        "--graph",
        &graph,
        "--output",
        "csv",
        "--columns",
        "page,type",
    ])
    .unwrap();
    let filters = env.prefs().filters(Path::new(&graph)).unwrap();
    assert_eq!(filters.selected, vec!["page", "type"]);
    assert_eq!(filters.seen, vec!["page", "due", "type"]);
}

#[test]
fn test_query_without_matches_keeps_column_preferences() {
    let env = Env::new();
    let graph = env.graph_arg();

    env.run(&["query", "has:type", "--graph", &graph]).unwrap();
    let before = env.prefs().filters(Path::new(&graph)).unwrap();
    assert_eq!(before.selected, vec!["page", "due", "type"]);

    assert_eq!(
        env.run(&["query", "type:magazine", "--graph", &graph]).unwrap(),
        ExitCode::NoMatches
    );
    assert_eq!(
        env.run(&["query", "type:magazine", "--graph", &graph, "--columns", "page"])
            .unwrap(),
        ExitCode::NoMatches
    );
    assert_eq!(env.prefs().filters(Path::new(&graph)).unwrap(), before);

    env.run(&["query", "has:type", "--graph", &graph]).unwrap();
    let after = env.prefs().filters(Path::new(&graph)).unwrap();
    assert_eq!(after.selected, vec!["page", "due", "type"]);
}

#[test]
fn test_explicit_sort_is_remembered_per_query() {
    let env = Env::new();
    let graph = env.graph_arg();

    env.run(&["query", "has:type", "--graph", &graph, "--sort", "type:desc"])
        .unwrap();

    let memory = env.prefs().sort(Path::new(&graph), "has:type").unwrap();
    assert_eq!(memory.sort_model.len(), 1);
    assert_eq!(memory.sort_model[0].col_id, "type");
    assert!(env.prefs().sort(Path::new(&graph), "type:book").is_none());
}

#[test]
fn test_analyze() {
    let env = Env::new();
    let graph = env.graph_arg();

    assert_eq!(
        env.run(&["analyze", "--graph", &graph]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(
        env.run(&["analyze", "--graph", &graph, "--key", "type"]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(
        env.run(&["analyze", "--graph", &graph, "--key", "missing"])
            .unwrap(),
        ExitCode::NoMatches
    );
}

#[test]
fn test_clear_cache_also_clears_preferences() {
    let env = Env::new();
    let graph = env.graph_arg();
    env.run(&["query", "has:type", "--graph", &graph]).unwrap();
    assert!(env.prefs().filters(Path::new(&graph)).is_some());

    assert_eq!(env.run(&["clear-cache"]).unwrap(), ExitCode::Success);

    assert!(!env.cache_dir().exists());
    assert!(env.prefs().filters(Path::new(&graph)).is_none());
    // The remembered graph path is not a column or sort preference
    assert!(env.prefs().graph_path().is_some());
}

#[test]
fn test_clear_cache_failure_is_reported() {
    let env = Env::new();
    // A regular file standing where the cache directory should be
    fs::write(env.cache_dir(), "not a directory").unwrap();

    let err = env.run(&["clear-cache"]).unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::GeneralError);
}

#[test]
fn test_clear_cache_succeeds_when_preferences_cannot_be_written() {
    let env = Env::new();
    let graph = env.graph_arg();
    // A directory standing where the preference file should be
    fs::create_dir_all(env.prefs_file()).unwrap();
    env.run(&["sync", &graph]).unwrap();
    assert!(env.cache_dir().is_dir());

    assert_eq!(env.run(&["clear-cache"]).unwrap(), ExitCode::Success);
    assert!(!env.cache_dir().exists());
}

#[test]
fn test_clear_prefs_for_one_graph() {
    let env = Env::new();
    let other = Env::new();
    let graph = env.graph_arg();
    let other_graph = other.graph_arg();

    env.run(&["query", "has:type", "--graph", &graph]).unwrap();
    env.run(&["query", "has:type", "--graph", &other_graph]).unwrap();

    env.run(&["clear-prefs", "--graph", &graph]).unwrap();

    assert!(env.prefs().filters(Path::new(&graph)).is_none());
    assert!(env.prefs().filters(Path::new(&other_graph)).is_some());
}
