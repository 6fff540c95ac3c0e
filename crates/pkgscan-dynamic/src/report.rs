//! Reporting the end of a phase walk.

use tracing::{error, info};

use crate::error::DynamicError;
use crate::outcome::Status;
use crate::phase::RunPhase;

/// Tracing target for analysis reports.
const REPORT_TARGET: &str = "pkgscan_dynamic::report";

/// Receives the conclusion of each analysis walk. Exactly one method is
/// called per walk.
pub trait AnalysisReporter {
    /// The walk stopped because `phase` could not be run.
    fn infrastructure_error(&self, package: &str, phase: Option<RunPhase>, error: &DynamicError);

    /// The walk finished with `phase` as the last phase attempted.
    fn phase_result(&self, package: &str, phase: Option<RunPhase>, status: Option<Status>);
}

/// Emits reports as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl AnalysisReporter for TracingReporter {
    fn infrastructure_error(&self, package: &str, phase: Option<RunPhase>, error: &DynamicError) {
        error!(
            target: REPORT_TARGET,
            package,
            last_phase = ?phase,
            error = %error,
            "dynamic analysis aborted"
        );
    }

    fn phase_result(&self, package: &str, phase: Option<RunPhase>, status: Option<Status>) {
        info!(
            target: REPORT_TARGET,
            package,
            last_phase = ?phase,
            last_status = ?status,
            "dynamic analysis finished"
        );
    }
}
