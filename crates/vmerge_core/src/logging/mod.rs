//! Logging infrastructure.
//!
//! This module provides:
//! - Per-run loggers with file + callback output
//! - A tail buffer of external tool output for failure reports
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use vmerge_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("merged", Some(Path::new("Output/logs")), LogConfig::default(), None)
//!     .unwrap();
//!
//! logger.phase("NormalizeConcat");
//! logger.command("ffmpeg -y -f concat -safe 0 -i concat.txt -c copy merged.mp4");
//! logger.success("Run completed");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub(crate) use run_logger::sanitize_filename;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG` and falls back to `default_level`. Output goes to
/// stderr. Call once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
