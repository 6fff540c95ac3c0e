//! Values used when no configuration layer sets a field.

use std::path::PathBuf;

use crate::logging::LogFormat;

/// Log filter applied when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Parser executable used when none is configured.
pub const DEFAULT_PARSER_PROGRAM: &str = "node";

/// Per-phase sandbox time limit, in seconds, used when none is configured.
pub const DEFAULT_PHASE_TIMEOUT_SECS: u64 = 900;

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default log format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default parser executable.
#[must_use]
pub fn default_parser_program() -> PathBuf {
    PathBuf::from(DEFAULT_PARSER_PROGRAM)
}
