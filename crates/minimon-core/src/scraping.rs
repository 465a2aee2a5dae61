//! Scrape driver: builds the configured probes and runs their update tasks.

#[cfg(test)]
#[path = "scraping_tests.rs"]
mod tests;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use minimon_config::{Config, SchedulerConfig};
use minimon_protocols::{FnTask, KvStore, Probe, ProbeError, ScrapeEvent, ScrapeSink};
use minimon_scheduler::{PeriodicTask, Scheduler};
use minimon_storage::NamespacedStore;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::registry::ProbeRegistry;
use crate::shutdown::Shutdown;

/// Interval of the periodic bookkeeping store sync.
pub const STORAGE_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// One configured provider instance.
pub struct ProviderInstance {
    pub name: String,
    pub probe: Arc<dyn Probe>,
    pub scrape_interval: Duration,
}

/// Owns the probes and the store, and drives them through the scheduler.
pub struct ScrapeDriver {
    providers: Vec<ProviderInstance>,
    store: Arc<dyn KvStore>,
    scheduler: SchedulerConfig,
}

impl ScrapeDriver {
    pub fn new(providers: Vec<ProviderInstance>, store: Arc<dyn KvStore>, scheduler: SchedulerConfig) -> Self {
        Self {
            providers,
            store,
            scheduler,
        }
    }

    /// Build every configured provider through `registry`.
    ///
    /// Fails on unknown types, bad params, or a single-instance probe type
    /// configured more than once.
    pub fn build(config: &Config, registry: &ProbeRegistry, store: Arc<dyn KvStore>) -> Result<Self, RegistryError> {
        let mut providers = Vec::with_capacity(config.providers.len());
        let mut single_instance_types = HashSet::new();

        for (name, provider) in &config.providers {
            let probe_error = |source: ProbeError| RegistryError::Probe {
                name: name.clone(),
                source,
            };

            let probe = registry
                .create(&provider.provider_type, &provider.params, provider.scrape_interval)
                .map_err(probe_error)?;

            if !probe.multiple_instances_allowed()
                && !single_instance_types.insert(provider.provider_type.clone())
            {
                return Err(probe_error(ProbeError::SingleInstance(provider.provider_type.clone())));
            }

            info!(
                "Provider {} ({}) ready, scraping every {:?}",
                name, provider.provider_type, provider.scrape_interval
            );
            providers.push(ProviderInstance {
                name: name.clone(),
                probe,
                scrape_interval: provider.scrape_interval,
            });
        }

        Ok(Self::new(providers, store, config.scheduler.clone()))
    }

    pub fn providers(&self) -> &[ProviderInstance] {
        &self.providers
    }

    /// Collect the update tasks of every provider plus the store sync task.
    fn periodic_tasks(
        &self,
        events: &mpsc::Sender<ScrapeEvent>,
        shutdown: &Shutdown,
    ) -> Result<Vec<PeriodicTask>, RegistryError> {
        let mut tasks = Vec::new();

        for provider in &self.providers {
            let sink = ScrapeSink::new(provider.name.clone(), events.clone());
            let store: Arc<dyn KvStore> =
                Arc::new(NamespacedStore::new(provider.name.clone(), Arc::clone(&self.store))?);
            for task in Arc::clone(&provider.probe).update_tasks(sink, store) {
                debug!("Scheduling {} every {:?}", task.name(), provider.scrape_interval);
                tasks.push(PeriodicTask::new(task, provider.scrape_interval));
            }
        }

        let store = Arc::clone(&self.store);
        let shutdown = shutdown.clone();
        let sync = FnTask::new("storage-sync", move || {
            let store = Arc::clone(&store);
            let shutdown = shutdown.clone();
            async move {
                // File IO stays off the async workers.
                match tokio::task::spawn_blocking(move || store.sync(false)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => shutdown.fail(format!("storage sync failed: {}", e)),
                    Err(e) => shutdown.fail(format!("storage sync task failed: {}", e)),
                }
            }
        });
        tasks.push(PeriodicTask::new(Arc::new(sync), STORAGE_SYNC_INTERVAL));

        Ok(tasks)
    }

    /// Run until shutdown, then destroy every probe once.
    ///
    /// `events` is dropped on return, closing the pipeline input.
    pub async fn run(self, events: mpsc::Sender<ScrapeEvent>, shutdown: Shutdown) {
        match self.periodic_tasks(&events, &shutdown) {
            Ok(tasks) => {
                drop(events);
                Scheduler::new(tasks, &self.scheduler)
                    .run(shutdown.token().clone())
                    .await;
            }
            Err(e) => shutdown.fail(format!("cannot schedule providers: {}", e)),
        }

        for provider in &self.providers {
            debug!("Destroying provider {}", provider.name);
            provider.probe.destroy().await;
        }
        info!("Scrape driver stopped");
    }
}
