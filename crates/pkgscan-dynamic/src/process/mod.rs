//! Phase execution under `birdcage`.
//!
//! [`CagedRunner`] implements [`SandboxRunner`] on top of
//! [`pkgscan_sandbox::Sandbox`]. The command's working directory is the only
//! writable root; it is snapshotted before and after the run, and the
//! difference becomes the phase's [`FileWrites`]. The runner has no syscall
//! tracer, so the summary lists the executed command and nothing else.
//!
//! The phase's variables and working directory travel in a
//! [`LaunchContext`], and every variable name is added to the profile's
//! allow-list so the sandbox keeps it.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pkgscan_sandbox::process::Stdio;
use pkgscan_sandbox::{
    LaunchContext, Sandbox, SandboxChild, SandboxCommand, SandboxProfile, WriteSnapshot,
};
use tracing::{debug, warn};

use crate::error::DynamicError;
use crate::outcome::{CommandRecord, FileWrite, FileWrites, PhaseOutcome, Status, SyscallSummary};
use crate::package::PhaseCommand;
use crate::runner::SandboxRunner;

/// Tracing target for sandboxed phase processes.
const RUNNER_TARGET: &str = "pkgscan_dynamic::process";

/// Per-phase time limit used when none is configured.
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(900);

/// Interval between exit checks.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Environment variables passed through to every phase.
const BASE_ENVIRONMENT: [&str; 3] = ["PATH", "HOME", "LANG"];

/// Runs phase commands in a `birdcage` sandbox with a time limit.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use pkgscan_dynamic::{CagedRunner, PhaseCommand, SandboxRunner};
///
/// let runner = CagedRunner::new(Duration::from_secs(60));
/// let command = PhaseCommand::new("/usr/bin/npm")
///     .arg("install")
///     .working_dir("/tmp/pkg");
/// let outcome = runner.run(&command);
/// # let _ = outcome;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CagedRunner {
    timeout: Duration,
}

impl CagedRunner {
    /// Creates a runner that kills phases running longer than `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Per-phase time limit.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for CagedRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PHASE_TIMEOUT)
    }
}

impl SandboxRunner for CagedRunner {
    fn run(&self, command: &PhaseCommand) -> Result<PhaseOutcome, DynamicError> {
        let profile = build_profile(command);
        let roots = profile.read_write_paths().to_vec();
        let before = WriteSnapshot::capture(&roots).map_err(DynamicError::Snapshot)?;
        let sandbox = Sandbox::new(profile);

        debug!(
            target: RUNNER_TARGET,
            program = %command.program().display(),
            writable_roots = roots.len(),
            network = command.allows_network(),
            "spawning phase command"
        );

        let mut child = sandbox
            .spawn_with(sandbox_command(command), &launch_context(command))
            .map_err(|source| DynamicError::Sandbox {
                program: command.program().to_path_buf(),
                source,
            })?;
        let status = wait_for_exit(command, &mut child, self.timeout)?;

        let after = WriteSnapshot::capture(&roots).map_err(DynamicError::Snapshot)?;
        let file_writes: FileWrites = before
            .writes_until(&after)
            .into_iter()
            .map(FileWrite::from)
            .collect();

        debug!(
            target: RUNNER_TARGET,
            program = %command.program().display(),
            %status,
            files_written = file_writes.as_slice().len(),
            bytes_written = file_writes.total_bytes(),
            "phase command finished"
        );

        let summary = SyscallSummary::new(status).with_command(CommandRecord::new(
            command.argv(),
            command
                .envs()
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect(),
        ));
        Ok(PhaseOutcome::new(summary, file_writes))
    }
}

/// Builds the sandbox profile for a phase command.
fn build_profile(command: &PhaseCommand) -> SandboxProfile {
    let mut profile = BASE_ENVIRONMENT
        .into_iter()
        .map(str::to_owned)
        .chain(command.envs().keys().cloned())
        .fold(
            SandboxProfile::new().allow_executable(command.program()),
            SandboxProfile::allow_environment_variable,
        );
    if let Some(dir) = command.working_directory() {
        profile = profile.allow_read_write_path(dir);
    }
    if command.allows_network() {
        profile = profile.allow_networking();
    }
    profile
}

fn sandbox_command(command: &PhaseCommand) -> SandboxCommand {
    let mut process = SandboxCommand::new(command.program());
    process.args(command.args());
    process.stdin(Stdio::null());
    process.stdout(Stdio::null());
    process.stderr(Stdio::null());
    process
}

/// Variables and working directory the phase starts with.
fn launch_context(command: &PhaseCommand) -> LaunchContext {
    let context = command
        .envs()
        .iter()
        .fold(LaunchContext::new(), |launch, (key, value)| {
            launch.env(key.as_str(), value.as_str())
        });
    match command.working_directory() {
        Some(dir) => context.working_dir(dir),
        None => context,
    }
}

/// Exit polling over a running phase process.
trait PhaseProcess {
    /// Returns whether the process succeeded once it has exited.
    fn try_exit(&mut self) -> io::Result<Option<bool>>;
    fn kill(&mut self) -> io::Result<()>;
    fn reap(&mut self) -> io::Result<()>;
}

impl PhaseProcess for SandboxChild {
    fn try_exit(&mut self) -> io::Result<Option<bool>> {
        Ok(self.try_wait()?.map(|exit| exit.success()))
    }

    fn kill(&mut self) -> io::Result<()> {
        Self::kill(self)
    }

    fn reap(&mut self) -> io::Result<()> {
        self.wait().map(drop)
    }
}

/// Waits for the child to exit, killing it once `timeout` has elapsed.
///
/// The child is also killed and reaped when its state cannot be read.
fn wait_for_exit<P: PhaseProcess>(
    command: &PhaseCommand,
    child: &mut P,
    timeout: Duration,
) -> Result<Status, DynamicError> {
    let start = Instant::now();

    loop {
        match child.try_exit() {
            Ok(Some(success)) => {
                debug!(
                    target: RUNNER_TARGET,
                    program = %command.program().display(),
                    success,
                    "phase process exited"
                );
                return Ok(classify_exit(success));
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    warn!(
                        target: RUNNER_TARGET,
                        program = %command.program().display(),
                        timeout_secs = timeout.as_secs(),
                        "phase timed out, killing process"
                    );
                    stop(child);
                    return Ok(Status::ErrorTimeout);
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                warn!(
                    target: RUNNER_TARGET,
                    program = %command.program().display(),
                    error = %err,
                    "lost track of phase process, killing it"
                );
                stop(child);
                return Err(DynamicError::Io {
                    program: command.program().to_path_buf(),
                    action: "wait for",
                    source: Arc::new(err),
                });
            }
        }
    }
}

fn stop<P: PhaseProcess>(child: &mut P) {
    drop(child.kill());
    drop(child.reap());
}

const fn classify_exit(success: bool) -> Status {
    if success {
        Status::Completed
    } else {
        Status::ErrorUnknown
    }
}
