//! Structured logging setup.
//!
//! Console output goes to stderr so stdout stays free for the progress
//! lines printed by the binary. An optional log directory adds a daily
//! rolling file without ANSI colors.

use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,symphonia=warn";

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter`. When `log_dir` is given, logs are
/// also written to `analyzer.<date>.log` there, keeping the latest 5 files.
/// A log directory that cannot be created only disables the file output.
///
/// Returns an error if a global subscriber is already installed.
pub fn init(log_dir: Option<&Path>, default_filter: &str) -> Result<(), String> {
    let file_layer = log_dir.and_then(|dir| {
        let _ = fs::create_dir_all(dir);
        match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("analyzer")
            .filename_suffix("log")
            .max_log_files(5)
            .build(dir)
        {
            Ok(appender) => Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            Err(e) => {
                eprintln!("Log file disabled ({}): {}", dir.display(), e);
                None
            }
        }
    });
    let file_enabled = file_layer.is_some();

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| format!("Logger already initialized: {}", e))?;

    if let (Some(dir), true) = (log_dir, file_enabled) {
        tracing::debug!(log_dir = %dir.display(), "File logging enabled");
    }
    Ok(())
}
