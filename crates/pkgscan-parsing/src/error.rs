//! Errors raised while running the parser or reading its output.
//!
//! A syntax error in the input is deliberately absent: it is reported as an
//! invalid [`ExtractionResult`](crate::ExtractionResult), not as a failure.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failures that abort an extraction.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The parser process could not be started.
    #[error("failed to start parser {program}: {source}")]
    Spawn {
        /// Program that was launched.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Streaming source to the parser or collecting its output failed.
    #[error("failed to {action} parser {program}: {source}")]
    Io {
        /// Program being driven.
        program: PathBuf,
        /// Step that failed, phrased as a verb.
        action: &'static str,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The parser exited with a status other than success or the syntax
    /// error sentinel.
    #[error("parser {program} exited with status {status}: {stderr}")]
    ParserFailed {
        /// Program that failed.
        program: PathBuf,
        /// Exit status, or `-1` when the process was killed by a signal.
        status: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// A clean exit produced output that is not a JSON array.
    #[error("parser output is not a JSON array: {0}")]
    Decode(#[source] serde_json::Error),
}
