//! Alert pipeline orchestrator.
//!
//! Three stages, each owning its state, joined by bounded channels:
//! ingestion (state machines), filter (spam) and grouping.

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

use std::collections::HashMap;

use chrono::Local;
use minimon_config::AlertConfig;
use minimon_protocols::{Message, MetricId, ScrapeEvent};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::filter::AlertFilters;
use crate::grouping::AlertGrouping;
use crate::state_machine::MetricStateMachine;

/// Capacity of every queue between stages.
pub const QUEUE_CAPACITY: usize = 5;

type MetricMessage = (MetricId, Message);

/// Builds and spawns the pipeline stages.
pub struct AlertPipeline {
    config: AlertConfig,
}

impl AlertPipeline {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// Spawn all stages onto `tasks`.
    ///
    /// Stages stop when `cancel` fires or their input closes; a closing
    /// input propagates downstream.
    pub fn spawn(
        self,
        input: mpsc::Receiver<ScrapeEvent>,
        output: mpsc::Sender<Message>,
        cancel: CancellationToken,
        tasks: &mut JoinSet<()>,
    ) {
        let (raw_tx, raw_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (filtered_tx, filtered_rx) = mpsc::channel(QUEUE_CAPACITY);

        let ingestion = Ingestion::new(self.config.clone());
        tasks.spawn(ingestion.run(input, raw_tx, cancel.clone()));
        tasks.spawn(run_filter(raw_rx, filtered_tx, cancel.clone()));

        let grouping = AlertGrouping::new(self.config.grouping.window, Instant::now());
        tasks.spawn(grouping.run(filtered_rx, output, cancel));
    }
}

/// Send `item`, giving up when cancelled or when the receiver is gone.
async fn forward<T>(output: &mpsc::Sender<T>, item: T, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = output.send(item) => sent.is_ok(),
    }
}

/// Ingestion stage: sole owner of the state-machine map.
struct Ingestion {
    config: AlertConfig,
    machines: HashMap<MetricId, MetricStateMachine>,
}

impl Ingestion {
    fn new(config: AlertConfig) -> Self {
        Self {
            config,
            machines: HashMap::new(),
        }
    }

    /// Classify one event into at most one message.
    fn handle(&mut self, event: ScrapeEvent) -> Option<MetricMessage> {
        if event.metric_id().is_empty() {
            warn!("Dropping malformed scrape event without metric id: {:?}", event);
            return None;
        }

        match event {
            ScrapeEvent::MetricMessage {
                metric_id,
                name,
                description,
            } => Some((metric_id, Message::notification(format!("{}: {}", name, description)))),
            ScrapeEvent::MetricState {
                metric_id,
                name,
                is_healthy,
                description,
            } => {
                let machine = self
                    .machines
                    .entry(metric_id.clone())
                    .or_insert_with(|| MetricStateMachine::new(&self.config));
                machine
                    .update(is_healthy, &name, &description, Local::now())
                    .map(|message| (metric_id, message))
            }
        }
    }

    async fn run(
        mut self,
        mut input: mpsc::Receiver<ScrapeEvent>,
        output: mpsc::Sender<MetricMessage>,
        cancel: CancellationToken,
    ) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = input.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            debug!("Scrape event: {:?}", event);
            if let Some(item) = self.handle(event) {
                if !forward(&output, item, &cancel).await {
                    break;
                }
            }
        }
        debug!("Ingestion stage stopped");
    }
}

/// Filter stage: sole owner of the filter map.
async fn run_filter(
    mut input: mpsc::Receiver<MetricMessage>,
    output: mpsc::Sender<Message>,
    cancel: CancellationToken,
) {
    let mut filters = AlertFilters::new();
    'outer: loop {
        let (metric_id, message) = tokio::select! {
            _ = cancel.cancelled() => break,
            item = input.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };
        for allowed in filters.process(&metric_id, message, Instant::now()) {
            if !forward(&output, allowed, &cancel).await {
                break 'outer;
            }
        }
    }
    debug!("Filter stage stopped");
}
