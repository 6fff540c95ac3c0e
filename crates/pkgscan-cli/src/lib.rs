//! Command-line runtime for `pkgscan`.
//!
//! Two subcommands are offered:
//!
//! - `parse [--file PATH]` extracts identifiers, literals, and comments from
//!   a source file, or from stdin, and prints them as JSON. It exits `0` for
//!   valid source, `2` when the parser rejects the input, and `1` on failure;
//! - `dynamic --plan PLAN` runs a package's lifecycle phases in the sandbox
//!   and prints the report as JSON. It exits `1` when the harness could not
//!   finish the walk.
//!
//! Configuration flags such as `--log-format` must precede the subcommand.
//! Logs go to stderr so that stdout only ever carries the JSON result.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pkgscan_config::Config;

mod commands;
mod config;
mod errors;
pub mod telemetry;

use config::{ConfigLoader, OrthoConfigLoader, prepare_cli_arguments, split_config_arguments};
use errors::AppError;

/// Bundles the standard streams handed to the CLI runtime.
pub(crate) struct IoStreams<'a, R, W, E> {
    pub(crate) stdin: &'a mut R,
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, R: Read, W: Write, E: Write> IoStreams<'a, R, W, E> {
    pub(crate) const fn new(stdin: &'a mut R, stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pkgscan",
    about = "Static symbol extraction and sandboxed dynamic analysis of packages",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Extracts symbols from source code and prints them as JSON.
    Parse {
        /// Source file to parse. Standard input is read when omitted.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Runs a package's lifecycle phases in the sandbox.
    Dynamic {
        /// JSON plan naming the package and the command for each phase.
        #[arg(long, value_name = "PLAN")]
        plan: PathBuf,
    },
}

/// Runs the CLI using the provided arguments and standard streams.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdin, stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, R, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = match Cli::try_parse_from(prepare_cli_arguments(&args, &split)) {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            // `--help` and `--version` land here.
            return match write!(io.stdout, "{error}") {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(error) => return report_failure(io, &AppError::CliUsage(error)),
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| {
            telemetry::initialise(&config)?;
            Ok(config)
        })
        .and_then(|config| execute(cli.command, &config, io));

    match result {
        Ok(exit_code) => exit_code,
        Err(error) => report_failure(io, &error),
    }
}

fn execute<R, W, E>(
    command: CliCommand,
    config: &Config,
    io: &mut IoStreams<'_, R, W, E>,
) -> Result<ExitCode, AppError>
where
    R: Read,
    W: Write,
    E: Write,
{
    match command {
        CliCommand::Parse { file } => commands::parse(config, file, io),
        CliCommand::Dynamic { plan } => commands::dynamic(config, &plan, io),
    }
}

fn report_failure<R, W, E>(io: &mut IoStreams<'_, R, W, E>, error: &AppError) -> ExitCode
where
    E: Write,
{
    drop(writeln!(io.stderr, "{error}"));
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests;
