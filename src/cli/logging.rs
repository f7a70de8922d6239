//! Tracing subscriber setup for the CLI.
//!
//! `RUST_LOG` wins over the configured level. Logs go to stderr unless the
//! config names a file, so stdout stays clean for command output.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::config::LoggingConfig;

/// Build the filter: `RUST_LOG` if set and valid, else the configured level,
/// else `info`.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = build_filter(config);

    let result = if let Some(path) = &config.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("Failed to open log file '{}': {}", path.display(), e))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
    };

    // Already initialized (e.g. by a test harness).
    let _ = result;
    Ok(())
}
