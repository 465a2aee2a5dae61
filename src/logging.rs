//! Tracing initialization.

use std::path::Path;
use std::sync::OnceLock;

use minimon_config::{ConfigLoader, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the file writer flushing for the lifetime of the process.
static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Build the level filter: `RUST_LOG` wins over the configured level.
pub(crate) fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

/// Initialize tracing with console output and, when `dir` is set, a
/// daily-rotated log file.
pub(crate) fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = match &config.dir {
        Some(dir) => {
            let log_dir = ConfigLoader::expand_path(dir);
            std::fs::create_dir_all(Path::new(&log_dir))?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("minimon")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()?;

    Ok(())
}
