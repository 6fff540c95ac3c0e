//! Per-launch environment and working directory.
//!
//! `birdcage` commands carry neither variables nor a working directory: the
//! sandboxed child inherits both from the calling process, minus whatever the
//! profile strips. A [`LaunchContext`] is therefore applied to the parent for
//! the duration of the spawn and rolled back afterwards.

use std::env;
use std::path::{Path, PathBuf};

use crate::env_guard::EnvGuard;
use crate::error::SandboxError;

/// Variables and working directory handed to one sandboxed command.
///
/// Variables set here only reach the child when the profile allows their
/// names through.
///
/// ```
/// use pkgscan_sandbox::LaunchContext;
///
/// let context = LaunchContext::new()
///     .env("npm_config_cache", "/tmp/pkg-work/.npm")
///     .working_dir("/tmp/pkg-work");
/// assert_eq!(context.envs().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchContext {
    envs: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
}

impl LaunchContext {
    /// Creates a context that leaves the parent's state untouched.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            envs: Vec::new(),
            working_dir: None,
        }
    }

    /// Sets `key` to `value` for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Starts the child in `dir`.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Variables set for the child, in insertion order.
    #[must_use]
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// Directory the child starts in, if any.
    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Applies the context to the current process until the guard drops.
    ///
    /// Must only be called while the process is single-threaded.
    pub(crate) fn enter(&self) -> Result<LaunchGuard, SandboxError> {
        let restore_env = EnvGuard::capture();
        let previous_dir = self.working_dir.as_deref().map(change_dir).transpose()?;
        for (key, value) in &self.envs {
            // Environment mutation is `unsafe` in edition 2024; callers hold
            // the single-thread invariant.
            unsafe { env::set_var(key, value) };
        }
        Ok(LaunchGuard {
            previous_dir,
            _restore_env: restore_env,
        })
    }
}

fn change_dir(dir: &Path) -> Result<PathBuf, SandboxError> {
    let working_dir_error = |source| SandboxError::WorkingDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let previous = env::current_dir().map_err(working_dir_error)?;
    env::set_current_dir(dir).map_err(working_dir_error)?;
    Ok(previous)
}

/// Restores the parent's working directory, then its environment.
#[derive(Debug)]
pub(crate) struct LaunchGuard {
    previous_dir: Option<PathBuf>,
    _restore_env: EnvGuard,
}

impl Drop for LaunchGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.previous_dir.take() {
            drop(env::set_current_dir(dir));
        }
    }
}
