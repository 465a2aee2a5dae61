//! Periodic task wrapper.

use std::sync::Arc;
use std::time::Duration;

use minimon_protocols::UpdateTask;
use tokio::time::Instant;

/// An update task together with its interval and last start time.
pub struct PeriodicTask {
    task: Arc<dyn UpdateTask>,
    interval: Duration,
    last_run: Option<Instant>,
}

impl PeriodicTask {
    pub fn new(task: Arc<dyn UpdateTask>, interval: Duration) -> Self {
        Self {
            task,
            interval,
            last_run: None,
        }
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    /// Next time the task is due. `None` means it never ran and is due now.
    pub fn next_run(&self) -> Option<Instant> {
        self.last_run.map(|last| last + self.interval)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_run().is_none_or(|next| next <= now)
    }

    /// Time left until the task is due, zero when already due.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_run()
            .map(|next| next.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Record a start at `now` and hand out the task to run.
    pub(crate) fn start(&mut self, now: Instant) -> Arc<dyn UpdateTask> {
        self.mark_started(now);
        self.handle()
    }

    /// The task to run, without recording a start.
    pub(crate) fn handle(&self) -> Arc<dyn UpdateTask> {
        Arc::clone(&self.task)
    }

    /// Record that a run actually began at `at`.
    pub(crate) fn mark_started(&mut self, at: Instant) {
        self.last_run = Some(at);
    }
}

impl std::fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name())
            .field("interval", &self.interval)
            .field("last_run", &self.last_run)
            .finish()
    }
}
