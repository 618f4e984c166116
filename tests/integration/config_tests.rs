use figment::providers::Serialized;
use figment::Figment;
use propdex::config::{Settings, SettingsOverrides};
use std::path::PathBuf;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
        .extract()
        .unwrap();
    assert_eq!(settings.cache_dir, PathBuf::from(".propdex_cache"));
    assert_eq!(
        settings.config_file.file_name().unwrap(),
        ".propdex_config.json"
    );
}

#[test]
fn test_env_then_cli_layering() {
    std::env::set_var("PROPDEX_CACHE_DIR", "/tmp/propdex-env-cache");
    std::env::set_var("PROPDEX_CONFIG_FILE", "/tmp/propdex-env.json");

    let from_env = Settings::load(&SettingsOverrides::default()).unwrap();
    assert_eq!(from_env.cache_dir, PathBuf::from("/tmp/propdex-env-cache"));
    assert_eq!(from_env.config_file, PathBuf::from("/tmp/propdex-env.json"));

    let overrides = SettingsOverrides {
        cache_dir: Some(PathBuf::from("/tmp/propdex-cli-cache")),
        config_file: None,
    };
    let from_cli = Settings::load(&overrides).unwrap();
    assert_eq!(from_cli.cache_dir, PathBuf::from("/tmp/propdex-cli-cache"));
    assert_eq!(from_cli.config_file, PathBuf::from("/tmp/propdex-env.json"));

    std::env::remove_var("PROPDEX_CACHE_DIR");
    std::env::remove_var("PROPDEX_CONFIG_FILE");
}

#[test]
fn test_stores_use_resolved_locations() {
    let settings = Settings {
        cache_dir: PathBuf::from("/tmp/propdex-c"),
        config_file: PathBuf::from("/tmp/propdex-p.json"),
    };
    let graph = std::path::Path::new("/graphs/notes");
    assert!(settings
        .cache_store()
        .cache_file(graph)
        .starts_with("/tmp/propdex-c"));
    assert_eq!(
        settings.preference_store().path(),
        PathBuf::from("/tmp/propdex-p.json")
    );
}
