//! Storage and logging configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::default_true;

/// Persistent key-value store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Whether chat history is persisted.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON file backing the store.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Age after which records expire.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,

    /// Interval of the background sweep.
    #[serde(default = "default_sweep_interval_hours")]
    pub sweep_interval_hours: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_store_path(),
            ttl_hours: default_ttl_hours(),
            sweep_interval_hours: default_sweep_interval_hours(),
        }
    }
}

fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".pagemind").join("store.json"))
        .unwrap_or_else(|| PathBuf::from(".pagemind/store.json"))
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_sweep_interval_hours() -> u64 {
    12
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Write rotated log files in addition to stderr.
    #[serde(default = "default_true")]
    pub file: bool,

    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: true,
            directory: default_log_directory(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".pagemind").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".pagemind/logs"))
}
