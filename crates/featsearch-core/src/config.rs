//! Configuration types for featsearch.
//!
//! [`Config::load`] reads `~/.config/featsearch/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).
//! `FEATSEARCH_*` environment variables override both, e.g.
//! `FEATSEARCH_BACKEND__BASE_URL=http://scope:8080`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[search]
debounce_ms     = 200
bucket_limit    = 10
commit_delay_ms = 50
clear_delay_ms  = 50

[backend]
base_url   = "http://127.0.0.1:8080"
timeout_ms = 5000
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration, loaded from `~/.config/featsearch/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

/// `[search]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Input silence required before a query is sent.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Maximum hits kept per result bucket.
    #[serde(default = "default_bucket_limit")]
    pub bucket_limit: usize,
    /// Delay before committing a selection that needs no secondary lookup.
    #[serde(default = "default_commit_delay_ms")]
    pub commit_delay_ms: u64,
    /// Delay between an empty-query reset and clearing the active feature.
    #[serde(default = "default_clear_delay_ms")]
    pub clear_delay_ms: u64,
}

fn default_debounce_ms() -> u64 { 200 }
fn default_bucket_limit() -> usize { 10 }
fn default_commit_delay_ms() -> u64 { 50 }
fn default_clear_delay_ms() -> u64 { 50 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            bucket_limit: default_bucket_limit(),
            commit_delay_ms: default_commit_delay_ms(),
            clear_delay_ms: default_clear_delay_ms(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }

    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms)
    }
}

/// `[backend]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String { "http://127.0.0.1:8080".to_string() }
fn default_timeout_ms() -> u64 { 5000 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/featsearch/config.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Load an explicit config file, layered on top of the built-in defaults
    /// and under `FEATSEARCH_*` environment overrides.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("FEATSEARCH").separator("__"))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("featsearch")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
