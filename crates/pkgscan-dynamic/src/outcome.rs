//! Per-phase outcomes and the aggregated report.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pkgscan_sandbox::WrittenFile;
use serde::{Serialize, Serializer};
use strum::Display;

use crate::error::DynamicError;
use crate::phase::RunPhase;

/// How a sandboxed phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    /// The command ran to a successful exit.
    Completed,
    /// The command was killed after exceeding its time limit.
    ErrorTimeout,
    /// The command failed for any other reason.
    ErrorUnknown,
}

/// A command observed running inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRecord {
    command: Vec<String>,
    environment: Vec<String>,
}

impl CommandRecord {
    /// Records an argument vector and the `KEY=value` environment it ran
    /// with.
    #[must_use]
    pub const fn new(command: Vec<String>, environment: Vec<String>) -> Self {
        Self {
            command,
            environment,
        }
    }

    /// Program followed by its arguments.
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Environment entries in `KEY=value` form.
    #[must_use]
    pub fn environment(&self) -> &[String] {
        &self.environment
    }
}

/// A file touched inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAccess {
    /// Accessed path.
    pub path: PathBuf,
    /// Whether the file was read.
    pub read: bool,
    /// Whether the file was written.
    pub write: bool,
    /// Whether the file was deleted.
    pub delete: bool,
}

/// A socket opened inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocketAccess {
    /// Remote address.
    pub address: String,
    /// Remote port.
    pub port: u16,
    /// Hostnames that resolved to `address`.
    pub hostnames: Vec<String>,
}

/// Condensed record of what a phase did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyscallSummary {
    status: Status,
    commands: Vec<CommandRecord>,
    files: Vec<FileAccess>,
    sockets: Vec<SocketAccess>,
}

impl SyscallSummary {
    /// Creates a summary with no recorded activity.
    #[must_use]
    pub const fn new(status: Status) -> Self {
        Self {
            status,
            commands: Vec::new(),
            files: Vec::new(),
            sockets: Vec::new(),
        }
    }

    /// Adds an executed command.
    #[must_use]
    pub fn with_command(mut self, command: CommandRecord) -> Self {
        self.commands.push(command);
        self
    }

    /// Adds a file access.
    #[must_use]
    pub fn with_file(mut self, file: FileAccess) -> Self {
        self.files.push(file);
        self
    }

    /// Adds a socket access.
    #[must_use]
    pub fn with_socket(mut self, socket: SocketAccess) -> Self {
        self.sockets.push(socket);
        self
    }

    /// Completion status of the phase.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Commands executed during the phase.
    #[must_use]
    pub fn commands(&self) -> &[CommandRecord] {
        &self.commands
    }

    /// Files accessed during the phase.
    #[must_use]
    pub fn files(&self) -> &[FileAccess] {
        &self.files
    }

    /// Sockets touched during the phase.
    #[must_use]
    pub fn sockets(&self) -> &[SocketAccess] {
        &self.sockets
    }
}

/// Bytes written to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileWrite {
    path: PathBuf,
    bytes_written: u64,
}

impl FileWrite {
    /// Records `bytes_written` bytes written to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, bytes_written: u64) -> Self {
        Self {
            path: path.into(),
            bytes_written,
        }
    }

    /// Written path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl From<WrittenFile> for FileWrite {
    fn from(written: WrittenFile) -> Self {
        let (path, bytes_written) = written.into_parts();
        Self {
            path,
            bytes_written,
        }
    }
}

/// Files a phase wrote, with byte counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileWrites(Vec<FileWrite>);

impl FileWrites {
    /// Writes in path order.
    #[must_use]
    pub fn as_slice(&self) -> &[FileWrite] {
        &self.0
    }

    /// Total bytes written across all files.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.0.iter().map(FileWrite::bytes_written).sum()
    }
}

impl FromIterator<FileWrite> for FileWrites {
    fn from_iter<I: IntoIterator<Item = FileWrite>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Everything recorded for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseOutcome {
    syscall_summary: SyscallSummary,
    file_writes: FileWrites,
}

impl PhaseOutcome {
    /// Pairs a syscall summary with the phase's file writes.
    #[must_use]
    pub const fn new(syscall_summary: SyscallSummary, file_writes: FileWrites) -> Self {
        Self {
            syscall_summary,
            file_writes,
        }
    }

    /// Completion status of the phase.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.syscall_summary.status()
    }

    /// Syscall summary.
    #[must_use]
    pub const fn syscall_summary(&self) -> &SyscallSummary {
        &self.syscall_summary
    }

    /// File writes.
    #[must_use]
    pub const fn file_writes(&self) -> &FileWrites {
        &self.file_writes
    }
}

/// Outcomes of every phase that ran without an infrastructure failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DynamicResults(BTreeMap<RunPhase, PhaseOutcome>);

impl DynamicResults {
    /// Outcome recorded for `phase`.
    #[must_use]
    pub fn get(&self, phase: RunPhase) -> Option<&PhaseOutcome> {
        self.0.get(&phase)
    }

    /// Whether `phase` has a recorded outcome.
    #[must_use]
    pub fn contains(&self, phase: RunPhase) -> bool {
        self.0.contains_key(&phase)
    }

    /// Number of recorded phases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no phase was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded outcomes keyed by phase.
    pub fn iter(&self) -> impl Iterator<Item = (RunPhase, &PhaseOutcome)> {
        self.0.iter().map(|(phase, outcome)| (*phase, outcome))
    }

    pub(crate) fn record(&mut self, phase: RunPhase, outcome: PhaseOutcome) {
        self.0.insert(phase, outcome);
    }
}

/// Result of walking a package's phases.
///
/// `last_phase` is the phase attempted last, `None` only when the package
/// lists no phases. `last_status` is that phase's status, `None` after an
/// infrastructure failure. When `error` is set, `results` has no entry for
/// `last_phase`.
#[derive(Debug, Serialize)]
pub struct DynamicReport {
    results: DynamicResults,
    last_phase: Option<RunPhase>,
    last_status: Option<Status>,
    #[serde(serialize_with = "serialize_error")]
    error: Option<DynamicError>,
}

impl DynamicReport {
    pub(crate) const fn new(
        results: DynamicResults,
        last_phase: Option<RunPhase>,
        last_status: Option<Status>,
        error: Option<DynamicError>,
    ) -> Self {
        Self {
            results,
            last_phase,
            last_status,
            error,
        }
    }

    /// Per-phase outcomes.
    #[must_use]
    pub const fn results(&self) -> &DynamicResults {
        &self.results
    }

    /// Phase attempted last.
    #[must_use]
    pub const fn last_phase(&self) -> Option<RunPhase> {
        self.last_phase
    }

    /// Status of the phase attempted last.
    #[must_use]
    pub const fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    /// Infrastructure failure that stopped the walk.
    #[must_use]
    pub const fn error(&self) -> Option<&DynamicError> {
        self.error.as_ref()
    }

    /// Splits the report into its parts.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        DynamicResults,
        Option<RunPhase>,
        Option<Status>,
        Option<DynamicError>,
    ) {
        (self.results, self.last_phase, self.last_status, self.error)
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<DynamicError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.collect_str(error),
        None => serializer.serialize_none(),
    }
}
