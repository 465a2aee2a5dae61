//! Scrape events published by probes.

use serde::{Deserialize, Serialize};

/// Stable key identifying one observable health aspect.
///
/// Rendered as `<provider-instance>/<component>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(String);

impl MetricId {
    /// Build a metric id from a provider-instance name and a provider-local id.
    pub fn new(provider: &str, component: &str) -> Self {
        Self(format!("{}/{}", provider, component))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MetricId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An observation published by a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScrapeEvent {
    /// Health state of a metric.
    MetricState {
        metric_id: MetricId,
        /// Human-readable metric name.
        name: String,
        is_healthy: bool,
        description: String,
    },
    /// One-off message without health semantics.
    MetricMessage {
        metric_id: MetricId,
        /// Human-readable metric name.
        name: String,
        description: String,
    },
}

impl ScrapeEvent {
    /// Create a state event.
    pub fn state(
        metric_id: impl Into<MetricId>,
        name: impl Into<String>,
        is_healthy: bool,
        description: impl Into<String>,
    ) -> Self {
        ScrapeEvent::MetricState {
            metric_id: metric_id.into(),
            name: name.into(),
            is_healthy,
            description: description.into(),
        }
    }

    /// Create a one-off message event.
    pub fn message(
        metric_id: impl Into<MetricId>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        ScrapeEvent::MetricMessage {
            metric_id: metric_id.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// The metric this event belongs to.
    pub fn metric_id(&self) -> &MetricId {
        match self {
            ScrapeEvent::MetricState { metric_id, .. } => metric_id,
            ScrapeEvent::MetricMessage { metric_id, .. } => metric_id,
        }
    }
}
