//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{TimeOfDay, serde_duration};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Prefix for every outgoing notification title. Host name when unset.
    #[serde(default)]
    pub machine_name: Option<String>,

    /// Path of the persistent key/value cache.
    #[serde(default = "default_cache")]
    pub cache: String,

    /// How long to wait for tasks to stop after cancellation.
    #[serde(default = "default_shutdown_grace", with = "serde_duration")]
    pub shutdown_grace: Duration,

    #[serde(default)]
    pub alert: AlertConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub notifiers: BTreeMap<String, NotifierConfig>,

    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            machine_name: None,
            cache: default_cache(),
            shutdown_grace: default_shutdown_grace(),
            alert: AlertConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
            notifiers: BTreeMap::new(),
            providers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Cache path with `~` expanded.
    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.cache).as_ref())
    }

    /// Configured machine name, falling back to the host name.
    pub fn machine_name(&self) -> String {
        match &self.machine_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => nix::unistd::gethostname()
                .ok()
                .and_then(|name| name.into_string().ok())
                .unwrap_or_else(|| "localhost".to_string()),
        }
    }
}

fn default_cache() -> String {
    "~/.minimon/cache.json".to_string()
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(5)
}

/// Alerting behavior shared by every metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Consecutive OK results needed to recover.
    #[serde(default = "default_threshold")]
    pub healthy_threshold: u32,

    /// Consecutive failures needed to alert.
    #[serde(default = "default_threshold")]
    pub unhealthy_threshold: u32,

    /// Interval between short-term reminders.
    #[serde(default = "default_failure_reminder", with = "serde_duration")]
    pub failure_reminder: Duration,

    /// Number of short-term reminders.
    #[serde(default = "default_failure_reminder_count")]
    pub failure_reminder_count: u32,

    /// Time of day for the daily reminder.
    #[serde(default = "default_daily_reminder")]
    pub daily_reminder: TimeOfDay,

    #[serde(default)]
    pub grouping: GroupingConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            healthy_threshold: default_threshold(),
            unhealthy_threshold: default_threshold(),
            failure_reminder: default_failure_reminder(),
            failure_reminder_count: default_failure_reminder_count(),
            daily_reminder: default_daily_reminder(),
            grouping: GroupingConfig::default(),
        }
    }
}

fn default_threshold() -> u32 {
    1
}

fn default_failure_reminder() -> Duration {
    Duration::from_secs(2 * 3600)
}

fn default_failure_reminder_count() -> u32 {
    3
}

fn default_daily_reminder() -> TimeOfDay {
    TimeOfDay { hour: 8, minute: 0 }
}

/// Alert grouping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Time an open batch waits before it is flushed.
    #[serde(default = "default_grouping_window", with = "serde_duration")]
    pub window: Duration,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            window: default_grouping_window(),
        }
    }
}

fn default_grouping_window() -> Duration {
    Duration::from_secs(15)
}

/// Scheduler execution policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerPolicy {
    Serial,
    #[default]
    Parallel,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of tasks running at once in parallel mode.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub policy: SchedulerPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            policy: SchedulerPolicy::default(),
        }
    }
}

fn default_workers() -> usize {
    8
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated log files.
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One configured notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(rename = "type")]
    pub notifier_type: String,

    #[serde(default = "default_params")]
    pub params: serde_json::Value,
}

/// One configured metric provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: String,

    #[serde(default = "default_scrape_interval", with = "serde_duration")]
    pub scrape_interval: Duration,

    #[serde(default = "default_params")]
    pub params: serde_json::Value,
}

fn default_params() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_scrape_interval() -> Duration {
    Duration::from_secs(120)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.cache, "~/.minimon/cache.json");
        assert_eq!(config.shutdown_grace, Duration::from_secs(5));
        assert_eq!(config.alert.healthy_threshold, 1);
        assert_eq!(config.alert.unhealthy_threshold, 1);
        assert_eq!(config.alert.failure_reminder, Duration::from_secs(7200));
        assert_eq!(config.alert.failure_reminder_count, 3);
        assert_eq!(config.alert.daily_reminder.to_string(), "08:00");
        assert_eq!(config.alert.grouping.window, Duration::from_secs(15));
        assert_eq!(config.scheduler.workers, 8);
        assert_eq!(config.scheduler.policy, SchedulerPolicy::Parallel);
        assert_eq!(config.logging.level, "info");
        assert!(config.notifiers.is_empty());
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_empty_document_matches_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.cache, Config::default().cache);
        assert_eq!(config.scheduler.workers, 8);
    }

    #[test]
    fn test_cache_path_expands_tilde() {
        let config = Config::default();
        assert!(!config.cache_path().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_machine_name_configured() {
        let config = Config {
            machine_name: Some("db-1".to_string()),
            ..Config::default()
        };
        assert_eq!(config.machine_name(), "db-1");
    }

    #[test]
    fn test_machine_name_falls_back_to_hostname() {
        let config = Config::default();
        assert!(!config.machine_name().is_empty());
    }

    #[test]
    fn test_provider_defaults() {
        let provider: ProviderConfig =
            serde_json::from_str(r#"{"type": "filesystem"}"#).unwrap();
        assert_eq!(provider.provider_type, "filesystem");
        assert_eq!(provider.scrape_interval, Duration::from_secs(120));
        assert!(provider.params.is_object());
    }

    #[test]
    fn test_scheduler_policy_serde() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"policy": "serial"}"#).unwrap();
        assert_eq!(config.policy, SchedulerPolicy::Serial);
        assert!(serde_json::from_str::<SchedulerConfig>(r#"{"policy": "random"}"#).is_err());
    }
}
