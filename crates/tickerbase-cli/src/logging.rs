//! Process-wide `tracing` subscriber.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

pub const LOG_FILE_NAME: &str = "tickerbase.log";

/// Install the subscriber. `RUST_LOG` overrides the configured level.
///
/// Logs go to `<logPath>/tickerbase.log` when a log path is configured and
/// to stderr otherwise, or when the file cannot be opened.
pub fn init(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_ascii_lowercase()));

    let (writer, to_file, fallback) = match config.log_path.as_deref() {
        Some(dir) => match open_log_file(dir) {
            Ok(file) => (BoxMakeWriter::new(Arc::new(file)), true, None),
            Err(error) => (BoxMakeWriter::new(io::stderr), false, Some(error)),
        },
        None => (BoxMakeWriter::new(io::stderr), false, None),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(!to_file)
        .try_init()
        .is_ok();

    if let Some(error) = fallback {
        tracing::warn!(%error, "failed to open log file, using stderr");
    }
    tracing::debug!(installed, level = %config.log_level, "logging initialized");
}

/// Open (creating if needed) the log file inside `dir` for appending.
pub fn open_log_file(dir: &Path) -> io::Result<File> {
    fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
}
