//! Phased dynamic analysis of packages.
//!
//! A package's lifecycle is a sequence of [`RunPhase`]s, such as install
//! followed by import. [`run_dynamic_analysis`] runs each phase's command
//! through a [`SandboxRunner`] and collects what it did, stopping at the
//! first phase that does not complete.
//!
//! Two kinds of failure are kept apart:
//!
//! - the package fails or hangs: the phase is recorded with a status other
//!   than [`Status::Completed`] and the walk stops without an error;
//! - the harness cannot run the phase: nothing is recorded for it, the
//!   status is cleared, and the [`DynamicError`] is returned in the report.
//!
//! The outcome is announced once per walk through an [`AnalysisReporter`].
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use pkgscan_dynamic::{CagedRunner, PackagePlan, TracingReporter, run_dynamic_analysis};
//!
//! # fn main() -> Result<(), pkgscan_dynamic::PlanError> {
//! let plan = PackagePlan::from_path(Path::new("left-pad.plan.json"))?;
//! let report = run_dynamic_analysis(&CagedRunner::default(), &plan, &TracingReporter);
//! if let Some(error) = report.error() {
//!     eprintln!("analysis aborted: {error}");
//! }
//! # Ok(()) }
//! ```

pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod package;
pub mod phase;
pub mod process;
pub mod report;
pub mod runner;

#[cfg(test)]
mod tests;

pub use self::error::{DynamicError, PlanError};
pub use self::orchestrator::{PhaseStep, run_dynamic_analysis};
pub use self::outcome::{
    CommandRecord, DynamicReport, DynamicResults, FileAccess, FileWrite, FileWrites,
    PhaseOutcome, SocketAccess, Status, SyscallSummary,
};
pub use self::package::{PackageDescriptor, PackagePlan, PhaseCommand, PlannedPhase};
pub use self::phase::RunPhase;
pub use self::process::{CagedRunner, DEFAULT_PHASE_TIMEOUT};
pub use self::report::{AnalysisReporter, TracingReporter};
pub use self::runner::SandboxRunner;
