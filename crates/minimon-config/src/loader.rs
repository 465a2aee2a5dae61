//! Configuration loader.
//!
//! Text is env-interpolated first, then parsed into a generic map, then
//! mapped onto [`Config`].

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

use crate::error::ConfigError;
use crate::schema::Config;

const KNOWN_KEYS: &[&str] = &[
    "machine_name",
    "cache",
    "shutdown_grace",
    "alert",
    "scheduler",
    "logging",
    "notifiers",
    "providers",
];

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:(\$)|\{([^}]+)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("env var pattern is valid")
});

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file. `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::load_json_str(&content)
        } else {
            Self::load_str(&content)
        }
    }

    /// Load configuration from a TOML string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let document: serde_json::Value = toml::from_str(&expanded)?;
        Self::from_document(document)
    }

    /// Load configuration from a JSON string.
    pub fn load_json_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let document: serde_json::Value = serde_json::from_str(&expanded)?;
        Self::from_document(document)
    }

    /// Map a parsed document onto the typed schema.
    pub fn from_document(document: serde_json::Value) -> Result<Config, ConfigError> {
        let serde_json::Value::Object(map) = &document else {
            return Err(ConfigError::InvalidFormat(
                "top-level document must be a map".to_string(),
            ));
        };
        for key in map.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("Ignoring unknown config key: {}", key);
            }
        }
        let config: Config = serde_json::from_value(document)?;
        Ok(config)
    }

    /// Expand `${VAR}` and `$VAR`; `$$` is a literal `$`.
    ///
    /// Unset and empty variables are errors.
    pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut missing: Option<String> = None;
        let expanded = ENV_VAR_RE.replace_all(content, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }
            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match std::env::var(name) {
                Ok(value) if !value.is_empty() => value,
                _ => {
                    missing.get_or_insert_with(|| name.to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(name) => Err(ConfigError::EnvVarNotSet(name)),
            None => Ok(expanded.into_owned()),
        }
    }

    /// Expand shell-style paths (e.g., `~/.minimon`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}
