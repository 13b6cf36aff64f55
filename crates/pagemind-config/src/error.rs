//! Configuration errors.

use thiserror::Error;

/// Errors from loading or validating a PageMind config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config path does not exist. `load_or_default` falls back to defaults.
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    /// First error reported by [`crate::ValidationResult::into_result`].
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A `${VAR}` reference names an unset variable.
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
