use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Variable checked before `RUST_LOG` for the filter directives.
pub const LOG_ENV: &str = "NEWSDECK_LOG";

const LOG_FILE: &str = "newsdeck.log";

/// `$XDG_DATA_HOME/newsdeck` (or platform equivalent).
pub fn log_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir().context("Could not determine data directory")?;
    Ok(dir.join("newsdeck"))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a file-backed subscriber.
///
/// The terminal belongs to the UI, so everything goes to
/// `<data dir>/newsdeck/newsdeck.log`. Keep the returned guard alive until
/// exit or buffered lines are lost.
pub fn init() -> anyhow::Result<Option<WorkerGuard>> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    match tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // A subscriber is already installed; the guard is dropped with it.
        Err(_) => Ok(None),
    }
}
