//! Serial and bounded-parallel scheduling loops.

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use minimon_config::{SchedulerConfig, SchedulerPolicy};
use minimon_protocols::UpdateTask;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::task::PeriodicTask;

/// Shortest sleep between ticks.
pub const MIN_SLEEP: Duration = Duration::from_secs(1);

/// Longest sleep between ticks.
pub const MAX_SLEEP: Duration = Duration::from_secs(60);

/// Periodic task scheduler.
pub struct Scheduler {
    tasks: Vec<PeriodicTask>,
    policy: SchedulerPolicy,
    workers: usize,
}

impl Scheduler {
    pub fn new(tasks: Vec<PeriodicTask>, config: &SchedulerConfig) -> Self {
        Self {
            tasks,
            policy: config.policy,
            workers: config.workers.max(1),
        }
    }

    pub fn tasks(&self) -> &[PeriodicTask] {
        &self.tasks
    }

    /// Run until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Scheduler started: {} tasks, policy {:?}, {} workers",
            self.tasks.len(),
            self.policy,
            self.workers
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.policy {
                SchedulerPolicy::Serial => self.tick_serial(&cancel).await,
                SchedulerPolicy::Parallel => self.tick_parallel(&cancel).await,
            }

            if cancel.is_cancelled() {
                break;
            }

            let sleep = self.next_sleep(Instant::now());
            debug!("Scheduler sleeping for {:?}", sleep);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(sleep) => {}
            }
        }

        info!("Scheduler stopped");
    }

    /// Run every due task one after the other.
    async fn tick_serial(&mut self, cancel: &CancellationToken) {
        for index in 0..self.tasks.len() {
            if cancel.is_cancelled() {
                return;
            }
            let now = Instant::now();
            if !self.tasks[index].is_due(now) {
                continue;
            }
            let task = self.tasks[index].start(now);
            let name = task.name().to_string();
            Self::report(&name, Self::execute(task).await);
        }
    }

    /// Dispatch every due task into the worker pool and wait for all of them.
    ///
    /// A task's start time is the moment it got a worker, not the moment it
    /// was queued. Tasks still queued when `cancel` fires are skipped.
    async fn tick_parallel(&mut self, cancel: &CancellationToken) {
        let now = Instant::now();
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut running: JoinSet<(usize, Option<Instant>, Result<(), JoinError>)> = JoinSet::new();

        for (index, periodic) in self.tasks.iter().enumerate() {
            if !periodic.is_due(now) {
                continue;
            }
            let task = periodic.handle();
            let permits = Arc::clone(&permits);
            let cancel = cancel.clone();
            running.spawn(async move {
                let _permit = permits.acquire_owned().await;
                if cancel.is_cancelled() {
                    return (index, None, Ok(()));
                }
                let started = Instant::now();
                (index, Some(started), Self::execute(task).await)
            });
        }

        while let Some(joined) = running.join_next().await {
            match joined {
                Ok((index, Some(started), result)) => {
                    let periodic = &mut self.tasks[index];
                    periodic.mark_started(started);
                    Self::report(periodic.name(), result);
                }
                Ok((index, None, _)) => {
                    debug!("Task {} skipped, scheduler is stopping", self.tasks[index].name());
                }
                Err(e) => error!("Worker failed: {}", e),
            }
        }
    }

    /// Run one task on its own tokio task so a panic stays contained.
    async fn execute(task: Arc<dyn UpdateTask>) -> Result<(), JoinError> {
        tokio::spawn(async move { task.run().await }).await
    }

    fn report(name: &str, result: Result<(), JoinError>) {
        match result {
            Ok(()) => debug!("Task {} finished", name),
            Err(e) if e.is_panic() => error!("Task {} panicked", name),
            Err(e) => error!("Task {} did not complete: {}", name, e),
        }
    }

    /// Time until the earliest task is due, clamped to `[MIN_SLEEP, MAX_SLEEP]`.
    pub fn next_sleep(&self, now: Instant) -> Duration {
        self.tasks
            .iter()
            .map(|task| task.time_until_due(now))
            .min()
            .unwrap_or(MAX_SLEEP)
            .clamp(MIN_SLEEP, MAX_SLEEP)
    }
}
