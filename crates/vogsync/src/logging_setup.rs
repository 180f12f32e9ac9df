//! Tracing subscriber for the player binary.
//!
//! Console output goes to stderr so the session summary on stdout stays clean.
//! File output appends to one dated file per day under `LogConfig::log_dir`,
//! written by a background worker that lives as long as the returned [`LogGuard`].

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use vogsync_core::LogConfig;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Keeps the file writer flushing until the end of `main`
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Configured level, overridden by `RUST_LOG`
fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(config.parse_level().into())
        .from_env_lossy()
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {:?}", path))
}

/// Install the global subscriber described by `config`.
///
/// Returns a guard only when file output is enabled.
pub fn init(config: &LogConfig) -> Result<Option<LogGuard>> {
    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .with_filter(build_filter(config))
    });

    let mut file_layer = None;
    let mut guard = None;
    if config.file_output {
        config
            .ensure_log_directory()
            .context("Failed to create log directory")?;
        match config.cleanup_old_logs() {
            Ok(0) => {}
            Ok(removed) => eprintln!("Removed {} old log file(s)", removed),
            Err(e) => eprintln!("Warning: failed to clean up old log files: {}", e),
        }

        let log_path = config.current_log_path();
        let (writer, worker_guard) = tracing_appender::non_blocking(open_log_file(&log_path)?);
        eprintln!("Session log: {:?}", log_path);

        file_layer = Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(build_filter(config)),
        );
        guard = Some(LogGuard {
            _guard: worker_guard,
        });
    }

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Logging was already initialized")?;

    tracing::info!(
        "Logging at {} (console: {}, file: {})",
        config.level,
        config.console_output,
        config.file_output
    );
    Ok(guard)
}
