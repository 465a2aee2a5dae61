//! Per-metric spam suppression.
//!
//! Each metric keeps the timestamps of its last [`SPAM_THRESHOLD`] messages.
//! When that many messages arrive within [`SPAM_WINDOW`], further messages
//! are dropped until the rate falls again.

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;

use std::collections::HashMap;
use std::time::Duration;

use minimon_protocols::{Message, MetricId};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::ring_buffer::RingBuffer;

/// Number of messages per window that counts as spam.
pub const SPAM_THRESHOLD: usize = 5;

/// Rolling window for spam detection.
pub const SPAM_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Spam state of a single metric.
#[derive(Debug, Clone)]
pub struct MetricFilter {
    recent: RingBuffer<Instant>,
    lost: usize,
}

impl Default for MetricFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricFilter {
    pub fn new() -> Self {
        Self {
            recent: RingBuffer::new(SPAM_THRESHOLD),
            lost: 0,
        }
    }

    pub fn is_suppressing(&self) -> bool {
        self.lost > 0
    }

    /// Messages dropped in the current spam episode.
    pub fn lost(&self) -> usize {
        self.lost
    }

    /// Register `message` at `now` and return what to forward, in order.
    ///
    /// The spam control notices are part of the output and are never
    /// filtered themselves.
    pub fn process(&mut self, metric_id: &MetricId, message: Message, now: Instant) -> Vec<Message> {
        let mut out = Vec::with_capacity(2);

        self.recent.push(now);
        let rate_exceeded = self.recent.is_full()
            && self
                .recent
                .front()
                .is_some_and(|oldest| now.duration_since(oldest) <= SPAM_WINDOW);

        if rate_exceeded {
            if self.is_suppressing() {
                debug!("Metric {}: still spamming", metric_id);
            } else {
                warn!("Metric {}: spam detected", metric_id);
                out.push(Message::notification(format!(
                    "spam detected, suppressing further notifications for {}",
                    metric_id
                )));
            }
            self.lost += 1;
        } else if self.is_suppressing() {
            info!("Metric {}: end of spam ({} messages lost)", metric_id, self.lost);
            out.push(Message::notification(format!(
                "end of spam for {}, {} lost",
                metric_id, self.lost
            )));
            self.lost = 0;
        }

        if self.is_suppressing() {
            debug!("Filtering: {:?}", message);
        } else {
            out.push(message);
        }
        out
    }
}

/// Filters for every metric seen so far.
///
/// Owned by the filter stage only.
#[derive(Debug, Default)]
pub struct AlertFilters {
    filters: HashMap<MetricId, MetricFilter>,
}

impl AlertFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `message` through the filter of `metric_id`, creating it if absent.
    pub fn process(&mut self, metric_id: &MetricId, message: Message, now: Instant) -> Vec<Message> {
        self.filters
            .entry(metric_id.clone())
            .or_default()
            .process(metric_id, message, now)
    }

    pub fn get(&self, metric_id: &MetricId) -> Option<&MetricFilter> {
        self.filters.get(metric_id)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
