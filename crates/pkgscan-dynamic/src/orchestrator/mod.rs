//! Walking a package's phases through a sandbox runner.
//!
//! Phases run in the order the package lists them. Each run is classified
//! as a [`PhaseStep`]; the first step that is not a clean completion ends
//! the walk. A phase the package itself fails is still recorded, while a
//! phase the harness could not run is not.

use std::ops::ControlFlow;

use tracing::debug;

use crate::error::DynamicError;
use crate::outcome::{DynamicReport, DynamicResults, PhaseOutcome, Status};
use crate::package::PackageDescriptor;
use crate::phase::RunPhase;
use crate::report::AnalysisReporter;
use crate::runner::SandboxRunner;

/// Tracing target for the phase walk.
const WALK_TARGET: &str = "pkgscan_dynamic::orchestrator";

/// Classification of one phase run.
#[derive(Debug)]
pub enum PhaseStep {
    /// The phase completed; the walk continues.
    Completed(PhaseOutcome),
    /// The phase ran but did not complete; it is recorded and the walk
    /// stops.
    NotCompleted(PhaseOutcome),
    /// The phase could not be run; nothing is recorded and the walk stops.
    InfrastructureFailure(DynamicError),
}

impl From<Result<PhaseOutcome, DynamicError>> for PhaseStep {
    fn from(result: Result<PhaseOutcome, DynamicError>) -> Self {
        match result {
            Ok(outcome) if outcome.status() == Status::Completed => Self::Completed(outcome),
            Ok(outcome) => Self::NotCompleted(outcome),
            Err(error) => Self::InfrastructureFailure(error),
        }
    }
}

/// State carried between phases.
#[derive(Default)]
struct Walk {
    results: DynamicResults,
    last_phase: Option<RunPhase>,
    last_status: Option<Status>,
}

/// Why the walk ended early.
struct Stop {
    walk: Walk,
    error: Option<DynamicError>,
}

impl Walk {
    fn advance(mut self, phase: RunPhase, step: PhaseStep) -> ControlFlow<Stop, Self> {
        self.last_phase = Some(phase);
        match step {
            PhaseStep::Completed(outcome) => {
                self.last_status = Some(outcome.status());
                self.results.record(phase, outcome);
                ControlFlow::Continue(self)
            }
            PhaseStep::NotCompleted(outcome) => {
                self.last_status = Some(outcome.status());
                self.results.record(phase, outcome);
                ControlFlow::Break(Stop {
                    walk: self,
                    error: None,
                })
            }
            PhaseStep::InfrastructureFailure(error) => {
                self.last_status = None;
                ControlFlow::Break(Stop {
                    walk: self,
                    error: Some(error),
                })
            }
        }
    }
}

/// Runs every phase of `package` through `runner` until one does not
/// complete, then reports the conclusion to `reporter`.
///
/// # Example
///
/// ```
/// use pkgscan_dynamic::{
///     DynamicError, FileWrites, PackagePlan, PhaseCommand, PhaseOutcome, PlannedPhase,
///     RunPhase, SandboxRunner, Status, SyscallSummary, TracingReporter,
///     run_dynamic_analysis,
/// };
///
/// struct AlwaysCompletes;
///
/// impl SandboxRunner for AlwaysCompletes {
///     fn run(&self, _command: &PhaseCommand) -> Result<PhaseOutcome, DynamicError> {
///         Ok(PhaseOutcome::new(SyscallSummary::new(Status::Completed), FileWrites::default()))
///     }
/// }
///
/// let plan = PackagePlan::new(
///     "left-pad",
///     vec![PlannedPhase::new(RunPhase::Install, PhaseCommand::new("/usr/bin/npm"))],
/// )
/// .unwrap();
/// let report = run_dynamic_analysis(&AlwaysCompletes, &plan, &TracingReporter);
/// assert_eq!(report.last_phase(), Some(RunPhase::Install));
/// assert_eq!(report.last_status(), Some(Status::Completed));
/// ```
pub fn run_dynamic_analysis<R, P, A>(runner: &R, package: &P, reporter: &A) -> DynamicReport
where
    R: SandboxRunner + ?Sized,
    P: PackageDescriptor + ?Sized,
    A: AnalysisReporter + ?Sized,
{
    let name = package.name();
    let flow = package
        .run_phases()
        .into_iter()
        .try_fold(Walk::default(), |walk, phase| {
            let step = run_phase(runner, package, phase);
            walk.advance(phase, step)
        });

    let (walk, error) = match flow {
        ControlFlow::Continue(walk) => (walk, None),
        ControlFlow::Break(Stop { walk, error }) => (walk, error),
    };

    match &error {
        Some(error) => reporter.infrastructure_error(name, walk.last_phase, error),
        None => reporter.phase_result(name, walk.last_phase, walk.last_status),
    }

    DynamicReport::new(walk.results, walk.last_phase, walk.last_status, error)
}

fn run_phase<R, P>(runner: &R, package: &P, phase: RunPhase) -> PhaseStep
where
    R: SandboxRunner + ?Sized,
    P: PackageDescriptor + ?Sized,
{
    let Some(command) = package.command(phase) else {
        return PhaseStep::InfrastructureFailure(DynamicError::MissingCommand {
            package: package.name().to_owned(),
            phase,
        });
    };

    debug!(
        target: WALK_TARGET,
        package = package.name(),
        %phase,
        program = %command.program().display(),
        "running phase"
    );
    let step = PhaseStep::from(runner.run(&command));
    debug!(
        target: WALK_TARGET,
        package = package.name(),
        %phase,
        step = step.label(),
        "phase finished"
    );
    step
}

impl PhaseStep {
    const fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::NotCompleted(_) => "not_completed",
            Self::InfrastructureFailure(_) => "infrastructure_failure",
        }
    }
}
