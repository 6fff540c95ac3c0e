//! Infrastructure failures raised while running package phases.
//!
//! Anything the package itself causes, such as a non-zero exit or a hang,
//! is a completion [`Status`](crate::Status) rather than an error. The
//! variants here mean the harness could not observe the package at all.

use std::path::PathBuf;
use std::sync::Arc;

use pkgscan_sandbox::SandboxError;
use thiserror::Error;

use crate::phase::RunPhase;

/// Errors that abort a dynamic analysis walk.
#[derive(Debug, Error)]
pub enum DynamicError {
    /// The sandbox rejected the command or failed to start it.
    #[error("sandbox refused to run {program}: {source}")]
    Sandbox {
        /// Program the phase tried to run.
        program: PathBuf,
        /// Underlying sandbox error.
        #[source]
        source: SandboxError,
    },

    /// Waiting on or signalling the sandboxed process failed.
    #[error("failed to {action} {program}: {source}")]
    Io {
        /// Program the phase was running.
        program: PathBuf,
        /// Step that failed, phrased as a verb.
        action: &'static str,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The writable roots could not be snapshotted for file-write tracking.
    #[error("failed to snapshot file writes: {0}")]
    Snapshot(#[source] SandboxError),

    /// The package lists a phase it has no command for.
    #[error("package '{package}' has no command for phase {phase}")]
    MissingCommand {
        /// Package name.
        package: String,
        /// Phase without a command.
        phase: RunPhase,
    },
}

/// Errors raised while loading a [`PackagePlan`](crate::PackagePlan).
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file could not be read.
    #[error("failed to read package plan {path}: {source}")]
    Read {
        /// Plan file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The plan is not valid JSON or does not match the plan schema.
    #[error("invalid package plan: {0}")]
    Decode(#[source] serde_json::Error),

    /// The same phase appears twice in the plan.
    #[error("phase {0} is listed more than once")]
    DuplicatePhase(RunPhase),
}
