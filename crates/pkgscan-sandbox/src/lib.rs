//! Isolated execution of package lifecycle commands.
//!
//! `pkgscan-sandbox` wraps [`birdcage`] with the policy defaults used when
//! running untrusted package code: networking is denied, the environment is
//! stripped, and only the package work directory is writable. A
//! [`SandboxProfile`] lists what a phase command may touch and a [`Sandbox`]
//! launches the command under that profile.
//!
//! The crate also provides [`WriteSnapshot`], a before/after view of the
//! writable roots from which the bytes a phase wrote to disk are derived.
//!
//! ```rust,no_run
//! use pkgscan_sandbox::{Sandbox, SandboxCommand, SandboxProfile, WriteSnapshot, process::Stdio};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = SandboxProfile::new()
//!     .allow_executable("/usr/bin/npm")
//!     .allow_read_write_path("/tmp/pkg-work");
//! let sandbox = Sandbox::new(profile);
//!
//! let before = WriteSnapshot::capture(sandbox.profile().read_write_paths())?;
//! let mut command = SandboxCommand::new("/usr/bin/npm");
//! command.arg("install").stdout(Stdio::null());
//! let status = sandbox.spawn(command)?.wait()?;
//! let after = WriteSnapshot::capture(sandbox.profile().read_write_paths())?;
//!
//! for written in before.writes_until(&after) {
//!     println!("{} +{}", written.path().display(), written.bytes_written());
//! }
//! # let _ = status;
//! # Ok(()) }
//! ```
//!
//! `birdcage` commands carry no environment or working directory of their
//! own; [`Sandbox::spawn_with`] takes a [`LaunchContext`] that is applied to
//! the parent for the duration of the spawn.
//!
//! [`Sandbox::spawn`] must be called while the process is single-threaded;
//! otherwise it returns [`SandboxError::MultiThreaded`] instead of tripping
//! the assertion inside `birdcage`.

mod env_guard;
mod error;
mod launch;
mod profile;
mod runtime;
mod sandbox;
mod snapshot;

#[cfg(test)]
mod tests;

pub use birdcage::process;
pub use error::SandboxError;
pub use launch::LaunchContext;
pub use profile::{EnvironmentPolicy, NetworkPolicy, SandboxProfile};
pub use sandbox::{Sandbox, SandboxChild, SandboxCommand};
pub use snapshot::{WriteSnapshot, WrittenFile};
