//! Structured logging setup.
//!
//! stdout carries the IPC protocol, so human-readable output goes to stderr
//! and a daily-rotated copy goes to `<data_dir>/logs/rehearsal.<date>.log`.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,symphonia=warn";

/// Initialize the global subscriber.
///
/// If the log directory cannot be created or opened, logging continues on
/// stderr only.
pub fn init(log_dir: &Path) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let file_layer = open_appender(log_dir).map(|appender| {
        fmt::layer()
            .with_writer(appender)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });
    let file_logging = file_layer.is_some();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if file_logging {
        tracing::info!(log_dir = %log_dir.display(), "Logger initialized");
    } else {
        tracing::warn!(log_dir = %log_dir.display(), "File logging unavailable, using stderr only");
    }
}

fn open_appender(log_dir: &Path) -> Option<RollingFileAppender> {
    std::fs::create_dir_all(log_dir).ok()?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("rehearsal")
        .filename_suffix("log")
        .max_log_files(5)
        .build(log_dir)
        .ok()
}
