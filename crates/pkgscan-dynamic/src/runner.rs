//! The sandboxed-execution seam.

use crate::error::DynamicError;
use crate::outcome::PhaseOutcome;
use crate::package::PhaseCommand;

/// Runs one phase command in isolation.
///
/// The production implementation is
/// [`CagedRunner`](crate::process::CagedRunner). Test code can implement
/// this trait to script phase outcomes without spawning anything.
///
/// # Example
///
/// ```
/// use pkgscan_dynamic::{
///     DynamicError, FileWrites, PhaseCommand, PhaseOutcome, SandboxRunner, Status,
///     SyscallSummary,
/// };
///
/// struct AlwaysCompletes;
///
/// impl SandboxRunner for AlwaysCompletes {
///     fn run(&self, _command: &PhaseCommand) -> Result<PhaseOutcome, DynamicError> {
///         Ok(PhaseOutcome::new(
///             SyscallSummary::new(Status::Completed),
///             FileWrites::default(),
///         ))
///     }
/// }
/// ```
pub trait SandboxRunner {
    /// Runs `command` and reports what it did.
    ///
    /// A command that fails or hangs still yields an outcome, with a status
    /// other than [`Status::Completed`](crate::Status::Completed).
    ///
    /// # Errors
    ///
    /// Returns a [`DynamicError`] only when the command could not be run or
    /// observed.
    fn run(&self, command: &PhaseCommand) -> Result<PhaseOutcome, DynamicError>;
}
