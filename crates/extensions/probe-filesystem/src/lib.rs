//! # minimon Probe - Filesystem
//!
//! Watches the available space of mountpoints. A mountpoint is unhealthy
//! while its available space is below `threshold`, given either relative to
//! the filesystem size (`20%`) or as a byte size (`10g`).
//!
//! Without an explicit `mountpoints` list, the mount table is scanned once at
//! startup: filesystems of a type in `fstypes` are watched unless their
//! mountpoint is in `mountpoint_blacklist`, and a device mounted several
//! times is watched once, at its shortest mountpoint.
//!
//! A second metric per mountpoint fails when the available space moves by
//! more than `rate_threshold` per `rate_threshold_window`, in either
//! direction.
//!
//! When the agent runs in a container with the host root mounted at, say,
//! `/host`, set `mount_prefix = "/host"` so metrics are named after the host
//! mountpoints.

#[cfg(test)]
#[path = "filesystem_tests.rs"]
mod tests;

mod window;

pub use window::{Sample, WindowCollector};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use minimon_config::types::{format_duration, serde_duration};
use minimon_config::RelativeAbsoluteValue;
use minimon_protocols::{FnTask, KvStore, Probe, ProbeError, ScrapeSink, UpdateTaskList};
use nix::sys::statvfs::statvfs;
use parking_lot::Mutex;
use serde::Deserialize;
use sysinfo::Disks;
use tokio::time::Instant;
use tracing::{info, warn};

/// Type name used in configuration.
pub const PROBE_TYPE: &str = "filesystem";

/// Filesystem probe parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesystemConfig {
    /// Mountpoints to watch. Empty means discover them from the mount table.
    #[serde(default, alias = "mountpoint_whitelist")]
    pub mountpoints: Vec<String>,
    /// Filesystem types picked up by discovery.
    #[serde(default = "default_fstypes")]
    pub fstypes: Vec<String>,
    /// Mountpoints skipped by discovery.
    #[serde(default)]
    pub mountpoint_blacklist: Vec<String>,
    /// Minimum available space.
    #[serde(default = "default_threshold")]
    pub threshold: RelativeAbsoluteValue,
    /// Largest change of available space tolerated per `rate_threshold_window`.
    #[serde(default = "default_rate_threshold")]
    pub rate_threshold: RelativeAbsoluteValue,
    #[serde(default = "default_rate_threshold_window", with = "serde_duration")]
    pub rate_threshold_window: Duration,
    /// Prefix stripped from mountpoints when naming metrics.
    #[serde(default)]
    pub mount_prefix: String,
}

fn default_fstypes() -> Vec<String> {
    vec!["ext4".to_string(), "btrfs".to_string()]
}

fn default_threshold() -> RelativeAbsoluteValue {
    RelativeAbsoluteValue::Relative(0.2)
}

fn default_rate_threshold() -> RelativeAbsoluteValue {
    RelativeAbsoluteValue::Absolute(1_000_000_000)
}

fn default_rate_threshold_window() -> Duration {
    Duration::from_secs(5 * 60)
}

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mountpoint: String,
    pub fs_type: String,
}

impl MountEntry {
    /// Filesystems currently mounted on this host.
    pub fn list() -> Vec<Self> {
        Disks::new_with_refreshed_list()
            .list()
            .iter()
            .map(|disk| Self {
                device: disk.name().to_string_lossy().into_owned(),
                mountpoint: disk.mount_point().to_string_lossy().into_owned(),
                fs_type: disk.file_system().to_string_lossy().into_owned(),
            })
            .collect()
    }
}

/// Space figures of one filesystem, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub available: u64,
    pub total: u64,
}

impl Usage {
    /// Query the filesystem holding `path`.
    pub fn of(path: &str) -> Result<Self, nix::Error> {
        let stat = statvfs(path)?;
        let fragment = stat.fragment_size() as u64;
        Ok(Self {
            available: stat.blocks_available() as u64 * fragment,
            total: stat.blocks() as u64 * fragment,
        })
    }

    /// Available space in percent of the total.
    pub fn available_percent(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        self.available.saturating_mul(100) / self.total
    }
}

/// Filesystem capacity probe.
pub struct FilesystemProbe {
    config: FilesystemConfig,
    /// Available-space samples per raw mountpoint.
    windows: Mutex<HashMap<String, WindowCollector<u64>>>,
}

impl FilesystemProbe {
    /// Validate `config` for a provider scraped every `scrape_interval`.
    pub fn new(config: FilesystemConfig, scrape_interval: Duration) -> Result<Self, ProbeError> {
        if config.mountpoints.is_empty() && config.fstypes.is_empty() {
            return Err(ProbeError::InvalidParams(
                "fstypes must not be empty when mountpoints are discovered".to_string(),
            ));
        }
        if config.rate_threshold_window < scrape_interval {
            return Err(ProbeError::InvalidParams(format!(
                "rate_threshold_window must be greater than or equal to scrape_interval ({} < {})",
                format_duration(config.rate_threshold_window),
                format_duration(scrape_interval)
            )));
        }
        Ok(Self {
            config,
            windows: Mutex::new(HashMap::new()),
        })
    }

    /// Build from a `params` table.
    pub fn from_params(params: &serde_json::Value, scrape_interval: Duration) -> Result<Self, ProbeError> {
        let config: FilesystemConfig = serde_json::from_value(params.clone())
            .map_err(|e| ProbeError::InvalidParams(e.to_string()))?;
        Self::new(config, scrape_interval)
    }

    /// Factory suitable for the probe registry.
    pub fn factory(params: &serde_json::Value, scrape_interval: Duration) -> Result<Arc<dyn Probe>, ProbeError> {
        Ok(Arc::new(Self::from_params(params, scrape_interval)?))
    }

    pub fn config(&self) -> &FilesystemConfig {
        &self.config
    }

    /// Name of `mountpoint` as seen from the host.
    pub fn display_mountpoint(&self, mountpoint: &str) -> String {
        let stripped = mountpoint
            .strip_prefix(self.config.mount_prefix.as_str())
            .unwrap_or(mountpoint);
        if stripped.starts_with('/') {
            stripped.to_string()
        } else {
            format!("/{}", stripped)
        }
    }

    /// Mountpoints to watch: the configured list, else those discovered in
    /// `entries`.
    pub fn select_mountpoints(&self, entries: &[MountEntry]) -> Vec<String> {
        if !self.config.mountpoints.is_empty() {
            return self.config.mountpoints.clone();
        }

        let mut by_device: BTreeMap<&str, &str> = BTreeMap::new();
        for entry in entries {
            if !self.config.fstypes.contains(&entry.fs_type)
                || self.config.mountpoint_blacklist.contains(&entry.mountpoint)
            {
                continue;
            }
            by_device
                .entry(entry.device.as_str())
                .and_modify(|kept| {
                    if entry.mountpoint.len() < kept.len() {
                        *kept = entry.mountpoint.as_str();
                    }
                })
                .or_insert(entry.mountpoint.as_str());
        }

        let mut mountpoints: Vec<String> = by_device.into_values().map(str::to_string).collect();
        mountpoints.sort();
        mountpoints
    }

    /// Whether `usage` is below the configured threshold.
    pub fn is_low(&self, usage: &Usage) -> bool {
        usage.available < self.config.threshold.value_for(usage.total)
    }

    /// Judge how fast the available space moved across `window`.
    ///
    /// `None` until the window spans two distinct instants.
    pub fn judge_rate(&self, window: &WindowCollector<u64>, total: u64) -> Option<Result<(), String>> {
        let (first, last) = (window.first()?, window.last()?);
        let elapsed = last.at.saturating_duration_since(first.at);
        if elapsed.is_zero() {
            return None;
        }

        let delta = first.value.abs_diff(last.value);
        let rate = delta as f64 / elapsed.as_secs_f64();
        let allowed = self.config.rate_threshold.value_for(total) as f64
            / self.config.rate_threshold_window.as_secs_f64();
        if rate < allowed {
            return Some(Ok(()));
        }

        let direction = if last.value > first.value { "increased" } else { "decreased" };
        Some(Err(format!(
            "available space {} rapidly by {} in {} to reach {}",
            direction,
            format_bytes(delta),
            format_duration(Duration::from_secs(elapsed.as_secs_f64().round() as u64)),
            format_bytes(last.value)
        )))
    }

    /// Add a sample for `mountpoint` and judge its rate.
    fn record_rate(&self, mountpoint: &str, usage: &Usage, at: Instant) -> Option<Result<(), String>> {
        let mut windows = self.windows.lock();
        let window = windows
            .entry(mountpoint.to_string())
            .or_insert_with(|| WindowCollector::new(self.config.rate_threshold_window));
        window.push(at, usage.available);
        self.judge_rate(window, usage.total)
    }

    async fn check_mountpoint(&self, sink: &ScrapeSink, mountpoint: &str) {
        let display = self.display_mountpoint(mountpoint);
        let name = format!("mountpoint {}", display);
        let metric = sink.metric(&format!("filesystem:{}", display), name.clone());

        let usage = match Usage::of(mountpoint) {
            Ok(usage) => usage,
            Err(e) => {
                metric
                    .push_failure(format!("unable to get remaining space: {}", e))
                    .await;
                return;
            }
        };

        if self.is_low(&usage) {
            metric
                .push_failure(format!(
                    "low space remaining ({}% / {})",
                    usage.available_percent(),
                    format_bytes(usage.available)
                ))
                .await;
        } else {
            metric.push_ok().await;
        }

        let verdict = self.record_rate(mountpoint, &usage, Instant::now());
        let rate_metric = sink.metric(&format!("filesystem_rate:{}", display), name);
        match verdict {
            Some(Ok(())) => rate_metric.push_ok().await,
            Some(Err(description)) => rate_metric.push_failure(description).await,
            None => {}
        }
    }
}

#[async_trait]
impl Probe for FilesystemProbe {
    fn probe_type(&self) -> &str {
        PROBE_TYPE
    }

    fn update_tasks(self: Arc<Self>, sink: ScrapeSink, _store: Arc<dyn KvStore>) -> UpdateTaskList {
        let entries = if self.config.mountpoints.is_empty() {
            MountEntry::list()
        } else {
            Vec::new()
        };
        let mountpoints: Arc<[String]> = self.select_mountpoints(&entries).into();
        if mountpoints.is_empty() {
            warn!(
                "No mounted filesystem of type {:?} to monitor",
                self.config.fstypes
            );
        }
        for mountpoint in mountpoints.iter() {
            info!("Monitoring available disk space on {}", mountpoint);
        }

        let task = FnTask::new(format!("{}/filesystem", sink.prefix()), move || {
            let probe = self.clone();
            let sink = sink.clone();
            let mountpoints = Arc::clone(&mountpoints);
            async move {
                for mountpoint in mountpoints.iter() {
                    probe.check_mountpoint(&sink, mountpoint).await;
                }
            }
        });
        vec![Arc::new(task)]
    }
}

/// Human-readable SI byte size, e.g. `3.2 GB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["kB", "MB", "GB", "TB", "PB", "EB"];
    if bytes < 1000 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = next;
    }
    format!("{:.1} {}", value, unit)
}
