//! Tracing initialization
//!
//! Output goes to stdout by default, or to a log file (optionally with
//! daily rotation) when `logging.file` is set. All writes go through a
//! non-blocking worker; the returned guard must stay alive for the
//! process lifetime or buffered lines are lost on shutdown.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    let file_target = config.file.as_deref().filter(|p| !p.is_empty());

    let (writer, guard) = tracing_appender::non_blocking(match file_target {
        Some(path) => file_writer(path, config),
        None => Box::new(io::stdout()) as Box<dyn io::Write + Send + Sync>,
    });

    let builder = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(EnvFilter::new(&config.level))
        // Escape codes belong on a terminal, not in files.
        .with_ansi(file_target.is_none());

    match config.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }

    guard
}

fn file_writer(path: &str, config: &LoggingConfig) -> Box<dyn io::Write + Send + Sync> {
    let path = Path::new(path);

    if config.enable_rotation {
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("shortgate");

        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(stem)
            .filename_suffix("log")
            .max_log_files(config.max_backups as usize)
            .build(dir)
            .expect("Failed to create rolling log appender");
        Box::new(appender)
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("Failed to open log file");
        Box::new(file)
    }
}
