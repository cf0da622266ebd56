//! Logging initialization.
//!
//! Structured logging via the `tracing` ecosystem. Output goes to stderr
//! (stdout is reserved for data such as `--json-summary`), and `RUST_LOG`
//! overrides everything else.

use lumen_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem from config, letting CLI flags win.
///
/// `--verbose` forces the debug level; `--json-logs` forces JSON output.
pub fn init(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    let default_level = if verbose { "debug" } else { &config.level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_logs || config.format == "json" {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}
