use crate::config::Config;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Where log lines go. A blank `log_file` means stderr.
#[derive(Debug, PartialEq)]
enum LogSink {
    File(PathBuf),
    Stderr,
}

impl LogSink {
    fn from_config(config: &Config) -> Self {
        match config.log_file.trim() {
            "" => LogSink::Stderr,
            path => LogSink::File(PathBuf::from(path)),
        }
    }
}

/// Installs the global subscriber when logging is enabled.
///
/// stderr shares the screen with the panel, so this is opt-in. The returned
/// guard flushes pending lines on drop and must outlive the event loop.
pub fn init(config: &Config) -> Option<WorkerGuard> {
    if !config.log_enabled {
        return None;
    }

    let mut open_error = None;
    let (writer, guard) = match LogSink::from_config(config) {
        LogSink::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogSink::File(path) => match open_log_file(&path) {
            Ok(file) => tracing_appender::non_blocking(file),
            Err(err) => {
                open_error = Some((path, err));
                tracing_appender::non_blocking(io::stderr())
            }
        },
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .compact();
    let installed = tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(layer)
        .try_init()
        .is_ok();

    if let (true, Some((path, err))) = (installed, open_error) {
        warn!("cannot open log file {}: {err}; using stderr", path.display());
    }
    Some(guard)
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// `RUST_LOG` wins over the configured level; a bad directive falls back to info.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(level)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn level_directive(level: &str) -> &str {
    match level.trim() {
        "" => "info",
        level => level,
    }
}
