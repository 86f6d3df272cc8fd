//! Diagnostic logging for the binary.
//!
//! Everything goes to stderr through `tracing-subscriber`, so stdout only
//! ever carries the report.

use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable that overrides the `-v` derived filter.
pub const LOG_ENV: &str = "SYMSORT_LOG";

/// Maps the number of `-v` flags to a default filter directive.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logger(verbosity: u8) {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| level_for(verbosity).to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .try_init();
}
