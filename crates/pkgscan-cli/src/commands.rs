//! Subcommand execution.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pkgscan_config::Config;
use pkgscan_dynamic::{
    CagedRunner, PackageDescriptor, PackagePlan, TracingReporter, run_dynamic_analysis,
};
use pkgscan_parsing::{ParserCommand, SourceInput, SymbolExtractor};
use serde::Serialize;
use tracing::{debug, warn};

use crate::IoStreams;
use crate::errors::AppError;

const COMMAND_TARGET: &str = "pkgscan_cli::commands";

/// Exit status for input the parser rejected as not being valid source.
pub(crate) const INVALID_SOURCE_EXIT: u8 = 2;

/// Builds the parser invocation described by `config`.
pub(crate) fn parser_command(config: &Config) -> ParserCommand {
    let command = ParserCommand::new(config.parser_program());
    match config.parser_script() {
        Some(script) => command.arg(script.as_os_str()),
        None => command,
    }
}

/// Extracts symbols from `file`, or from stdin when no file is given, and
/// prints the result as JSON.
pub(crate) fn parse<R, W, E>(
    config: &Config,
    file: Option<PathBuf>,
    io: &mut IoStreams<'_, R, W, E>,
) -> Result<ExitCode, AppError>
where
    R: Read,
    W: Write,
    E: Write,
{
    let input = match file {
        Some(path) => SourceInput::file(path),
        None => {
            let mut source = String::new();
            io.stdin
                .read_to_string(&mut source)
                .map_err(AppError::ReadSource)?;
            SourceInput::source(source)
        }
    };

    let extractor = SymbolExtractor::new(parser_command(config));
    let result = extractor.extract(&input)?;
    emit_json(&mut *io.stdout, &result)?;

    if result.is_valid() {
        debug!(
            target: COMMAND_TARGET,
            identifiers = result.identifiers().len(),
            literals = result.literals().len(),
            comments = result.comments().len(),
            "source parsed"
        );
        Ok(ExitCode::SUCCESS)
    } else {
        debug!(target: COMMAND_TARGET, "parser rejected the source");
        Ok(ExitCode::from(INVALID_SOURCE_EXIT))
    }
}

/// Runs every phase of the plan at `plan_path` in the sandbox and prints the
/// report as JSON.
pub(crate) fn dynamic<R, W, E>(
    config: &Config,
    plan_path: &Path,
    io: &mut IoStreams<'_, R, W, E>,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
{
    let plan = PackagePlan::from_path(plan_path)?;
    let runner = CagedRunner::new(config.phase_timeout());
    let report = run_dynamic_analysis(&runner, &plan, &TracingReporter);
    emit_json(&mut *io.stdout, &report)?;

    match report.error() {
        Some(error) => {
            warn!(target: COMMAND_TARGET, package = plan.name(), %error, "analysis aborted");
            writeln!(io.stderr, "dynamic analysis of {} aborted: {error}", plan.name())
                .map_err(AppError::EmitResult)?;
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

fn emit_json<W, T>(stdout: &mut W, value: &T) -> Result<(), AppError>
where
    W: Write,
    T: Serialize,
{
    serde_json::to_writer_pretty(&mut *stdout, value).map_err(AppError::SerialiseResult)?;
    stdout.write_all(b"\n").map_err(AppError::EmitResult)?;
    stdout.flush().map_err(AppError::EmitResult)
}
