//! Errors surfaced by the CLI runtime.

use std::io;
use std::sync::Arc;

use pkgscan_dynamic::PlanError;
use pkgscan_parsing::ParseError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read source from stdin: {0}")]
    ReadSource(io::Error),
    #[error("symbol extraction failed: {0}")]
    Extract(#[from] ParseError),
    #[error("failed to load package plan: {0}")]
    LoadPlan(#[from] PlanError),
    #[error("failed to serialise result: {0}")]
    SerialiseResult(serde_json::Error),
    #[error("failed to write result: {0}")]
    EmitResult(io::Error),
}
