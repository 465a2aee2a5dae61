//! Probe protocol definitions.
//!
//! A probe is built once at startup from its configuration. It hands the
//! scheduler a list of [`UpdateTask`]s; every run of a task publishes zero
//! or more [`ScrapeEvent`]s through the [`ScrapeSink`] it was given.

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::event::{MetricId, ScrapeEvent};
use crate::storage::KvStore;

/// List of update tasks returned by a probe.
pub type UpdateTaskList = Vec<Arc<dyn UpdateTask>>;

/// A zero-argument periodic action.
#[async_trait]
pub trait UpdateTask: Send + Sync {
    /// Task name (for logging).
    fn name(&self) -> &str;

    /// Run the task once.
    async fn run(&self);
}

/// Update task backed by an async closure.
pub struct FnTask<F> {
    name: String,
    f: F,
}

impl<F, Fut> FnTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    /// Create a new closure task.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

#[async_trait]
impl<F, Fut> UpdateTask for FnTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) {
        (self.f)().await
    }
}

/// Health probe.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe type name (as used in configuration).
    fn probe_type(&self) -> &str;

    /// Build the update tasks. Called exactly once, at startup.
    ///
    /// Tasks may be executed in parallel with each other, but a single task
    /// never overlaps itself.
    fn update_tasks(self: Arc<Self>, sink: ScrapeSink, store: Arc<dyn KvStore>) -> UpdateTaskList;

    /// Whether several instances of this probe type may be configured.
    fn multiple_instances_allowed(&self) -> bool {
        true
    }

    /// Cleanup hook, invoked once at shutdown.
    async fn destroy(&self) {}
}

/// Publishing handle given to a probe instance.
///
/// Prefixes every metric id with the provider-instance name.
#[derive(Clone)]
pub struct ScrapeSink {
    prefix: String,
    sender: mpsc::Sender<ScrapeEvent>,
}

impl ScrapeSink {
    /// Create a sink for the provider instance `prefix`.
    pub fn new(prefix: impl Into<String>, sender: mpsc::Sender<ScrapeEvent>) -> Self {
        Self {
            prefix: prefix.into(),
            sender,
        }
    }

    /// Provider-instance prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get a handle for one metric of this provider instance.
    pub fn metric(&self, component: &str, name: impl Into<String>) -> MetricHandle {
        MetricHandle {
            sink: self.clone(),
            metric_id: MetricId::new(&self.prefix, component),
            name: name.into(),
        }
    }

    /// Publish an event, waiting for queue capacity.
    ///
    /// Events published after the pipeline has shut down are dropped.
    pub async fn publish(&self, event: ScrapeEvent) {
        if let Err(e) = self.sender.send(event).await {
            debug!("Dropping scrape event, pipeline closed: {:?}", e.0.metric_id());
        }
    }
}

/// Handle for publishing observations of a single metric.
#[derive(Clone)]
pub struct MetricHandle {
    sink: ScrapeSink,
    metric_id: MetricId,
    name: String,
}

impl MetricHandle {
    /// Full metric id.
    pub fn metric_id(&self) -> &MetricId {
        &self.metric_id
    }

    /// Publish a health state.
    pub async fn push_state(&self, is_healthy: bool, description: impl Into<String>) {
        self.sink
            .publish(ScrapeEvent::state(
                self.metric_id.clone(),
                self.name.clone(),
                is_healthy,
                description,
            ))
            .await;
    }

    /// Publish a healthy observation.
    pub async fn push_ok(&self) {
        self.push_state(true, "").await;
    }

    /// Publish an unhealthy observation.
    pub async fn push_failure(&self, description: impl Into<String>) {
        self.push_state(false, description).await;
    }

    /// Publish a one-off message.
    pub async fn push_message(&self, description: impl Into<String>) {
        self.sink
            .publish(ScrapeEvent::message(
                self.metric_id.clone(),
                self.name.clone(),
                description,
            ))
            .await;
    }
}
