//! Launching phase commands through `birdcage`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use birdcage::process::{Child, Command};
use birdcage::{Birdcage, Exception, Sandbox as _};
use tracing::debug;

use crate::error::SandboxError;
use crate::launch::LaunchContext;
use crate::profile::SandboxProfile;
use crate::runtime::thread_count;

/// Tracing target for sandbox activation.
const SANDBOX_TARGET: &str = "pkgscan_sandbox::sandbox";

/// Command builder accepted by [`Sandbox::spawn`].
pub type SandboxCommand = Command;
/// Running sandboxed process.
pub type SandboxChild = Child;

/// Runs phase commands under a [`SandboxProfile`].
#[derive(Debug, Clone)]
pub struct Sandbox {
    profile: SandboxProfile,
}

impl Sandbox {
    /// Creates a sandbox enforcing `profile`.
    #[must_use]
    pub const fn new(profile: SandboxProfile) -> Self {
        Self { profile }
    }

    /// The profile this sandbox enforces.
    #[must_use]
    pub const fn profile(&self) -> &SandboxProfile {
        &self.profile
    }

    /// Spawns `command` inside the sandbox with the parent's working
    /// directory and no extra variables.
    ///
    /// # Errors
    ///
    /// See [`Sandbox::spawn_with`].
    pub fn spawn(&self, command: SandboxCommand) -> Result<SandboxChild, SandboxError> {
        self.spawn_with(command, &LaunchContext::new())
    }

    /// Spawns `command` inside the sandbox under `context`.
    ///
    /// The program must be an absolute path listed as executable in the
    /// profile, and every profile path must exist, as must the context's
    /// working directory. The context is applied to this process while
    /// `birdcage` forks the child and is rolled back before returning.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::MultiThreaded`] when called from a
    /// multi-threaded process, a preflight error when the program or profile
    /// paths are unusable, [`SandboxError::WorkingDirectory`] when the
    /// working directory cannot be entered, or [`SandboxError::Activation`]
    /// when `birdcage` fails to apply the policy or spawn the child.
    pub fn spawn_with(
        &self,
        command: SandboxCommand,
        context: &LaunchContext,
    ) -> Result<SandboxChild, SandboxError> {
        let program = absolute_program(Path::new(command.get_program()))?;
        let exceptions = self.exceptions_for(&program)?;
        if let Some(dir) = context.working_directory() {
            ensure_exists(dir)?;
        }

        let threads =
            thread_count().map_err(|source| SandboxError::ThreadCountUnavailable { source })?;
        if threads > 1 {
            return Err(SandboxError::MultiThreaded {
                thread_count: threads,
            });
        }

        debug!(
            target: SANDBOX_TARGET,
            program = %program.display(),
            exceptions = exceptions.len(),
            network_denied = self.profile.network_policy().is_denied(),
            working_dir = ?context.working_directory(),
            env_vars = context.envs().len(),
            "activating sandbox"
        );

        let _launch = context.enter()?;
        let mut cage = Birdcage::new();
        for exception in exceptions {
            cage.add_exception(exception)?;
        }
        Ok(cage.spawn(command)?)
    }

    fn exceptions_for(&self, program: &Path) -> Result<Vec<Exception>, SandboxError> {
        let executables = existing_set(self.profile.executable_paths())?;
        let authorised = executables
            .iter()
            .map(|path| canonicalise(path))
            .collect::<Result<BTreeSet<_>, _>>()?;
        if !authorised.contains(program) {
            return Err(SandboxError::ExecutableNotAuthorised {
                program: program.to_path_buf(),
            });
        }

        // `birdcage` resolves symlinks itself and recreates them inside the
        // sandbox, so exceptions keep the paths as the profile spelled them.
        let mut exceptions: Vec<Exception> = existing_set(self.profile.read_only_paths())?
            .into_iter()
            .map(Exception::Read)
            .collect();
        exceptions.extend(
            existing_set(self.profile.read_write_paths())?
                .into_iter()
                .map(Exception::WriteAndRead),
        );
        exceptions.extend(executables.into_iter().map(Exception::ExecuteAndRead));
        exceptions.extend(self.profile.environment_policy().exceptions());
        if !self.profile.network_policy().is_denied() {
            exceptions.push(Exception::Networking);
        }
        Ok(exceptions)
    }
}

fn absolute_program(program: &Path) -> Result<PathBuf, SandboxError> {
    if !program.is_absolute() {
        return Err(SandboxError::ProgramNotAbsolute(program.to_path_buf()));
    }
    canonicalise(program)
}

fn existing_set(paths: &[PathBuf]) -> Result<BTreeSet<PathBuf>, SandboxError> {
    paths
        .iter()
        .map(|path| ensure_exists(path).map(|()| path.clone()))
        .collect()
}

fn ensure_exists(path: &Path) -> Result<(), SandboxError> {
    if path.exists() {
        Ok(())
    } else {
        Err(SandboxError::MissingPath {
            path: path.to_path_buf(),
        })
    }
}

fn canonicalise(path: &Path) -> Result<PathBuf, SandboxError> {
    ensure_exists(path)?;
    fs::canonicalize(path).map_err(|source| SandboxError::CanonicalisationFailed {
        path: path.to_path_buf(),
        source,
    })
}
