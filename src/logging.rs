//! Tracing initialization

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize tracing from CLI verbosity and logging configuration.
///
/// Mapping:
/// - 0 (none) -> the configured level
/// - 1 (-v)   -> info
/// - 2 (-vv)  -> debug
/// - 3+ (-vvv)-> trace
///
/// `RUST_LOG` env var overrides both if set.
pub fn init(verbosity: u8, config: &LoggingConfig) {
    let level = match verbosity {
        0 => config.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mudcast={level}")));

    if config.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
