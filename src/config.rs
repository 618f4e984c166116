//! Runtime settings.
//!
//! Locations used by the binary are resolved with `figment`, later layers
//! overriding earlier ones:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. Environment: `PROPDEX_CACHE_DIR`, `PROPDEX_CONFIG_FILE`
//! 3. Command-line flags (`--cache-dir`, `--config`)

use anyhow::{Context, Result};
use directories::BaseDirs;
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cache::{CacheStore, DEFAULT_CACHE_DIR_NAME};
use crate::prefs::{PreferenceStore, DEFAULT_PREFERENCE_FILE_NAME};

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "PROPDEX_";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding one cache file per graph. Relative paths resolve
    /// against the working directory.
    pub cache_dir: PathBuf,
    /// Preference file
    pub config_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR_NAME),
            config_file: default_config_file(),
        }
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    /// `--cache-dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// `--config`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

impl Settings {
    /// The full provider stack: defaults, environment, then `overrides`.
    #[must_use]
    pub fn figment(overrides: &SettingsOverrides) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed(ENV_PREFIX).only(&["cache_dir", "config_file"]))
            .merge(Serialized::defaults(overrides))
    }

    /// Resolve settings from all layers.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer holds a value of the wrong type.
    pub fn load(overrides: &SettingsOverrides) -> Result<Self> {
        let settings: Self = Self::figment(overrides)
            .extract()
            .context("Failed to resolve settings")?;
        log::debug!(
            "Settings: cache_dir={}, config_file={}",
            settings.cache_dir.display(),
            settings.config_file.display()
        );
        Ok(settings)
    }

    /// Cache store rooted at [`Settings::cache_dir`].
    #[must_use]
    pub fn cache_store(&self) -> CacheStore {
        CacheStore::new(&self.cache_dir)
    }

    /// Preference store backed by [`Settings::config_file`].
    #[must_use]
    pub fn preference_store(&self) -> PreferenceStore {
        PreferenceStore::new(&self.config_file)
    }
}

/// `~/.propdex_config.json`, or the bare file name when no home directory
/// can be determined.
fn default_config_file() -> PathBuf {
    match BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(DEFAULT_PREFERENCE_FILE_NAME),
        None => {
            log::debug!("No home directory found, keeping preferences in the working directory");
            PathBuf::from(DEFAULT_PREFERENCE_FILE_NAME)
        }
    }
}
