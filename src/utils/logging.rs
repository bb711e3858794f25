//! Global tracing subscriber: console output plus an append-only log file
//! written through a non-blocking worker.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::utils::toml_config::ServerConfig;

/// Keeps the file writer flushing until the process exits.
static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `server.log_level` when set.
pub fn init(server: &ServerConfig) -> Result<(), LoggingError> {
    let file = open_log_file(server)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(level_filter(&server.log_level))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

    let _ = FILE_WRITER_GUARD.set(guard);
    Ok(())
}

fn level_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
}

/// Open `log_dir/log_file` for appending, creating the directory first.
fn open_log_file(server: &ServerConfig) -> Result<File, LoggingError> {
    std::fs::create_dir_all(&server.log_dir).map_err(|source| LoggingError::Directory {
        path: server.log_dir.clone(),
        source,
    })?;

    let path = server.log_dir.join(&server.log_file);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::File { path, source })
}
