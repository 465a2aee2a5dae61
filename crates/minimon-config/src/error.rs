//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a configuration file or accept its contents.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Malformed JSON or schema mismatch: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The document parsed but is not a table of sections.
    #[error("Invalid config layout: {0}")]
    InvalidFormat(String),

    /// `${NAME}` referenced an unset or empty variable.
    #[error("Environment variable ${0} is unset or empty")]
    EnvVarNotSet(String),

    /// Every validator error, joined as `path: message; ...`.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}
