//! # minimon Probe - Container
//!
//! Watches the containers of the local Docker engine:
//!
//! - a container not in the `running` state is unhealthy
//! - a container whose restart count went up since the last scrape is unhealthy
//! - a container now running another image than last recorded emits an
//!   "image was updated" notification; the last seen image id survives agent
//!   restarts through the bookkeeping store
//!
//! Only one container provider may be configured.

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;

mod api;

pub use api::{Container, ContainerApi, ContainerApiError, ContainerInspect, DockerClient};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use minimon_config::types::serde_duration;
use minimon_protocols::{FnTask, KvStore, Probe, ProbeError, ScrapeSink, UpdateTaskList};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info};

/// Type name used in configuration.
pub const PROBE_TYPE: &str = "container";

/// Container probe parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerConfig {
    /// Docker engine socket.
    #[serde(default = "default_socket")]
    pub socket: PathBuf,
    /// Timeout of one API request.
    #[serde(default = "default_timeout", with = "serde_duration")]
    pub timeout: Duration,
}

fn default_socket() -> PathBuf {
    PathBuf::from("/var/run/docker.sock")
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Container runtime probe.
pub struct ContainerProbe {
    api: Arc<dyn ContainerApi>,
    /// Last seen restart count per container id.
    restart_counts: Mutex<HashMap<String, u64>>,
}

impl ContainerProbe {
    pub fn new(api: Arc<dyn ContainerApi>) -> Self {
        Self {
            api,
            restart_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Build a probe talking to the Docker socket named in `params`.
    pub fn from_params(params: &serde_json::Value) -> Result<Self, ProbeError> {
        let config: ContainerConfig = serde_json::from_value(params.clone())
            .map_err(|e| ProbeError::InvalidParams(e.to_string()))?;
        if config.timeout.is_zero() {
            return Err(ProbeError::InvalidParams("timeout must be positive".to_string()));
        }
        info!("Watching containers through {}", config.socket.display());
        Ok(Self::new(Arc::new(DockerClient::new(config.socket, config.timeout))))
    }

    /// Factory suitable for the probe registry.
    pub fn factory(params: &serde_json::Value, _scrape_interval: Duration) -> Result<Arc<dyn Probe>, ProbeError> {
        Ok(Arc::new(Self::from_params(params)?))
    }

    /// One full pass over every container.
    pub async fn scrape(&self, sink: &ScrapeSink, store: &dyn KvStore) {
        let list_metric = sink.metric("containers:list", "container provider");
        let containers = match self.api.list().await {
            Ok(containers) => {
                list_metric.push_ok().await;
                containers
            }
            Err(e) => {
                list_metric
                    .push_failure(format!("failed to list containers: {}", e))
                    .await;
                return;
            }
        };
        debug!("Scraped {} container(s)", containers.len());

        let mut inspect_errors = Vec::new();
        for container in &containers {
            self.check_state(sink, container).await;
            self.check_image(sink, store, container).await;
            match self.api.inspect(&container.id).await {
                Ok(inspect) => self.check_restarts(sink, container, &inspect).await,
                Err(e) => inspect_errors.push(e.to_string()),
            }
        }

        let inspect_metric = sink.metric("containers:inspect", "container provider");
        if inspect_errors.is_empty() {
            inspect_metric.push_ok().await;
        } else {
            inspect_metric
                .push_failure(format!(
                    "unable to inspect containers: {}",
                    inspect_errors.join("; ")
                ))
                .await;
        }
    }

    async fn check_state(&self, sink: &ScrapeSink, container: &Container) {
        let metric = sink.metric(
            &format!("container_state:{}", container.id),
            format!("{} state", container.display_name()),
        );
        if container.is_running() {
            metric.push_ok().await;
        } else {
            metric
                .push_failure(format!("container isn't running ({})", container.state))
                .await;
        }
    }

    async fn check_image(&self, sink: &ScrapeSink, store: &dyn KvStore, container: &Container) {
        let key = format!("image_id/{}", container.stable_key());
        let known = store.get(&key).is_some();
        if store.set(&key, &container.image_id) && known {
            sink.metric(
                &format!("container_image:{}", container.id),
                format!("{} image update", container.display_name()),
            )
            .push_message("image was updated")
            .await;
        }
    }

    async fn check_restarts(&self, sink: &ScrapeSink, container: &Container, inspect: &ContainerInspect) {
        let previous = self
            .restart_counts
            .lock()
            .insert(container.id.clone(), inspect.restart_count)
            .unwrap_or(0);
        let metric = sink.metric(
            &format!("container_restart:{}", container.id),
            format!("{} restart", container.display_name()),
        );
        if inspect.restart_count != previous && inspect.restart_count > 0 {
            metric
                .push_failure(format!(
                    "container is restarting ({}, {})",
                    inspect.restart_count, container.status
                ))
                .await;
        } else {
            metric.push_ok().await;
        }
    }
}

#[async_trait]
impl Probe for ContainerProbe {
    fn probe_type(&self) -> &str {
        PROBE_TYPE
    }

    fn update_tasks(self: Arc<Self>, sink: ScrapeSink, store: Arc<dyn KvStore>) -> UpdateTaskList {
        let task = FnTask::new(format!("{}/containers", sink.prefix()), move || {
            let probe = self.clone();
            let sink = sink.clone();
            let store = Arc::clone(&store);
            async move {
                probe.scrape(&sink, store.as_ref()).await;
            }
        });
        vec![Arc::new(task)]
    }

    fn multiple_instances_allowed(&self) -> bool {
        false
    }
}
