//! Structured Logger
//!
//! Console output for operators and NDJSON file output for later inspection;
//! level controlled by `RUST_LOG` or the configured level.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log files are named `botforge.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "botforge.log";

/// `RUST_LOG` if set, else `level`, else `info` when `level` does not parse.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global logger. Returns `false` if a subscriber was
/// already installed (e.g. by a test harness).
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> bool {
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_directives() {
        if std::env::var_os("RUST_LOG").is_none() {
            let filter = build_filter("botforge_commands=debug,warn");
            assert!(filter.to_string().contains("botforge_commands=debug"));
        }
    }
}
