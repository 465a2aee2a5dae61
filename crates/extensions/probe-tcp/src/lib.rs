//! # minimon Probe - TCP
//!
//! Checks that a list of `host:port` targets accept TCP connections. A target
//! is unhealthy only after `retry_count` consecutive connection attempts fail.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use minimon_config::types::{format_duration, serde_duration};
use minimon_protocols::{FnTask, KvStore, Probe, ProbeError, ScrapeSink, UpdateTaskList};
use serde::Deserialize;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Type name used in configuration.
pub const PROBE_TYPE: &str = "tcp";

/// TCP probe parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TcpConfig {
    /// Targets as `host:port`.
    pub targets: Vec<String>,
    /// Connect timeout.
    #[serde(default = "default_timeout", with = "serde_duration")]
    pub timeout: Duration,
    /// Connection attempts per check.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retry_count() -> u32 {
    3
}

/// TCP reachability probe.
pub struct TcpProbe {
    config: TcpConfig,
}

impl TcpProbe {
    pub fn new(config: TcpConfig) -> Result<Self, ProbeError> {
        if config.targets.is_empty() {
            return Err(ProbeError::InvalidParams(
                "targets must list at least one host:port".to_string(),
            ));
        }
        for target in &config.targets {
            let valid = target
                .rsplit_once(':')
                .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
            if !valid {
                return Err(ProbeError::InvalidParams(format!(
                    "target '{}' is not of the form host:port",
                    target
                )));
            }
        }
        if config.timeout.is_zero() {
            return Err(ProbeError::InvalidParams("timeout must be positive".to_string()));
        }
        if config.retry_count == 0 {
            return Err(ProbeError::InvalidParams("retry_count must be at least 1".to_string()));
        }
        Ok(Self { config })
    }

    /// Build from a `params` table.
    pub fn from_params(params: &serde_json::Value) -> Result<Self, ProbeError> {
        let config: TcpConfig = serde_json::from_value(params.clone())
            .map_err(|e| ProbeError::InvalidParams(e.to_string()))?;
        Self::new(config)
    }

    /// Factory suitable for the probe registry.
    pub fn factory(params: &serde_json::Value, _scrape_interval: Duration) -> Result<Arc<dyn Probe>, ProbeError> {
        Ok(Arc::new(Self::from_params(params)?))
    }

    pub fn config(&self) -> &TcpConfig {
        &self.config
    }

    /// Try up to `retry_count` connections to `target`.
    ///
    /// Returns the description of the last failed attempt.
    pub async fn check(&self, target: &str) -> Result<(), String> {
        let mut last_error = String::new();
        for attempt in 1..=self.config.retry_count {
            match self.connect(target).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("Attempt {} to reach {} failed: {}", attempt, target, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn connect(&self, target: &str) -> Result<(), String> {
        match tokio::time::timeout(self.config.timeout, TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => {
                debug!("Connected to {}", target);
                Ok(())
            }
            Ok(Err(e)) => Err(format!("unable to connect: {}", e)),
            Err(_) => Err(format!(
                "no connection within {}",
                format_duration(self.config.timeout)
            )),
        }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn probe_type(&self) -> &str {
        PROBE_TYPE
    }

    fn update_tasks(self: Arc<Self>, sink: ScrapeSink, _store: Arc<dyn KvStore>) -> UpdateTaskList {
        self.config
            .targets
            .iter()
            .map(|target| {
                info!("Monitoring TCP reachability of {}", target);
                let probe = self.clone();
                let metric = sink.metric(&format!("tcp:{}", target), format!("tcp {}", target));
                let target = target.clone();
                let task = FnTask::new(format!("{}/tcp:{}", sink.prefix(), target), move || {
                    let probe = probe.clone();
                    let metric = metric.clone();
                    let target = target.clone();
                    async move {
                        match probe.check(&target).await {
                            Ok(()) => metric.push_ok().await,
                            Err(description) => metric.push_failure(description).await,
                        }
                    }
                });
                Arc::new(task) as Arc<dyn minimon_protocols::UpdateTask>
            })
            .collect()
    }
}
