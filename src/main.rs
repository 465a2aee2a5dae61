//! minimon - minimal host and container monitoring agent
//!
//! Main entry point: loads the configuration, wires probes, the alert
//! pipeline and the notifiers together, and runs until interrupted.

mod cli;
mod logging;
mod register;
mod signal;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use minimon_alert::{AlertPipeline, NotificationDispatcher, QUEUE_CAPACITY};
use minimon_config::types::format_duration;
use minimon_config::{Config, ConfigError, ConfigLoader, ConfigValidator, LoggingConfig, ValidationWarning};
use minimon_core::{NotifierRegistry, ProbeRegistry, ScrapeDriver, Shutdown};
use minimon_protocols::KvStore;
use minimon_storage::JsonStore;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::register::{register_notifiers, register_probes};
use crate::signal::ShutdownSignals;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_or_exit();

    let (config, warnings) = match load_config(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            let _ = logging::init_tracing(&LoggingConfig::default());
            error!("FATAL: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_tracing(&config.logging) {
        eprintln!("FATAL: cannot initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    for warning in &warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("FATAL: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load and validate the configuration file.
fn load_config(path: &Path) -> Result<(Config, Vec<ValidationWarning>), ConfigError> {
    let config = ConfigLoader::load(path)?;
    let warnings = ConfigValidator::validate(&config).into_result()?;
    Ok((config, warnings))
}

/// Run the agent until a shutdown signal or a fatal error.
async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let machine_name = config.machine_name();
    info!("Starting minimon v{} on {}", env!("CARGO_PKG_VERSION"), machine_name);

    let cache_path = config.cache_path();
    let store = Arc::new(JsonStore::open(&cache_path)?);
    store.sync(true)?;
    info!("Bookkeeping store at {}", cache_path.display());

    let notifier_registry = NotifierRegistry::new();
    register_notifiers(&notifier_registry)?;
    let probe_registry = ProbeRegistry::new();
    register_probes(&probe_registry)?;

    let mut dispatcher = NotificationDispatcher::new(machine_name);
    for (name, notifier) in notifier_registry.create_all(&config.notifiers)? {
        dispatcher.add_notifier(name, notifier);
    }
    let driver = ScrapeDriver::build(&config, &probe_registry, store.clone())?;
    info!(
        "{} provider(s), {} notifier(s) configured",
        driver.providers().len(),
        dispatcher.notifier_names().len()
    );

    let mut signals = ShutdownSignals::install()?;
    let shutdown = Shutdown::new();
    let (event_tx, event_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (message_tx, message_rx) = mpsc::channel(QUEUE_CAPACITY);

    let mut tasks = JoinSet::new();
    AlertPipeline::new(config.alert.clone()).spawn(event_rx, message_tx, shutdown.token().clone(), &mut tasks);
    tasks.spawn(dispatcher.run(message_rx, shutdown.token().clone()));
    tasks.spawn(driver.run(event_tx, shutdown.clone()));

    loop {
        tokio::select! {
            signal = signals.recv() => {
                info!("Received {}, shutting down", signal);
                break;
            }
            _ = shutdown.cancelled() => break,
            // Stages also end when their input closes, which is not an error.
            Some(result) = tasks.join_next() => {
                if let Err(e) = result {
                    if e.is_panic() {
                        shutdown.fail(format!("task panicked: {}", e));
                    }
                }
            }
        }
    }
    shutdown.cancel();

    let drain = async {
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    error!("Task panicked during shutdown: {}", e);
                }
            }
        }
    };
    if tokio::time::timeout(config.shutdown_grace, drain).await.is_err() {
        error!(
            "FATAL: forced exit, tasks still running after {}",
            format_duration(config.shutdown_grace)
        );
        tasks.abort_all();
    }

    store.sync(false)?;

    match shutdown.fatal_reason() {
        Some(reason) => Err(format!("exiting after fatal error: {}", reason).into()),
        None => {
            info!("minimon stopped");
            Ok(())
        }
    }
}
