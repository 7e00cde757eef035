//! Structured logging for BotForge.
//!
//! Console plus rolling NDJSON file output, and scrubbing of Discord
//! credentials before they reach either.

pub mod logger;
pub mod redact;

pub use logger::{build_filter, init_logger, LOG_FILE_PREFIX};
pub use redact::redact_sensitive_data;
