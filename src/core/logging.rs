//! Process-wide logging sink
//!
//! Initialized once from `main`; every module logs through `tracing`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::LoggingConfig;
use crate::core::error::{CrewError, Result};

/// Install the global subscriber writing to the configured log file.
///
/// The returned guard flushes the background writer on drop and must live
/// until the process exits. Calling this twice is an error.
pub fn init_logging(config: &LoggingConfig, debug: bool) -> Result<WorkerGuard> {
    let path = config.file.as_path();
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| CrewError::config(format!("Invalid log file path: {}", path.display())))?;

    std::fs::create_dir_all(directory)?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let level = if debug { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,pentest_crew={}", level)));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| CrewError::config(format!("Logging already initialized: {}", e)))?;

    tracing::info!(file = %path.display(), level, "Logging initialized");

    Ok(guard)
}
