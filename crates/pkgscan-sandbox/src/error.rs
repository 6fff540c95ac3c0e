//! Errors raised while preparing, launching, or observing a sandbox.

use std::io;
use std::path::PathBuf;

use birdcage::error::Error as BirdcageError;
use thiserror::Error;

/// Failures in the sandbox harness itself, as opposed to the command it runs.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Phase commands must name their program by absolute path.
    #[error("sandboxed commands require absolute program paths, got {0}")]
    ProgramNotAbsolute(PathBuf),

    /// The program is not listed as executable in the profile.
    #[error("executable {program} is not authorised by the sandbox profile")]
    ExecutableNotAuthorised {
        /// Canonical path of the rejected program.
        program: PathBuf,
    },

    /// A profile path does not exist on the host.
    #[error("path {path} does not exist on the host filesystem")]
    MissingPath {
        /// Path named in the profile or command.
        path: PathBuf,
    },

    /// A profile path could not be resolved to its canonical form.
    #[error("failed to canonicalise {path}: {source}")]
    CanonicalisationFailed {
        /// Path that failed to resolve.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// `birdcage` refuses to activate from a multi-threaded process.
    #[error("sandboxing must occur in a single-threaded context (observed {thread_count} threads)")]
    MultiThreaded {
        /// Threads observed in the current process.
        thread_count: usize,
    },

    /// The launch working directory could not be entered or left.
    #[error("failed to change into working directory {path}: {source}")]
    WorkingDirectory {
        /// Directory the command was to start in.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The thread count could not be read from `/proc`.
    #[error("failed to determine thread count: {source}")]
    ThreadCountUnavailable {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A writable root could not be walked while taking a snapshot.
    #[error("failed to snapshot writable path {path}: {source}")]
    Snapshot {
        /// Path being inspected when the walk failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// `birdcage` rejected an exception or failed to spawn the child.
    #[error("birdcage activation failed: {0}")]
    Activation(#[from] BirdcageError),
}
