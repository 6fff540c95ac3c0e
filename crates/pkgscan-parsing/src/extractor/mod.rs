//! Symbol extraction driven through a [`ParserExecutor`].
//!
//! [`SymbolExtractor`] owns the parser command and interprets the exit
//! status of each run. Decoding of clean output is delegated to
//! [`decode_output`].

use tracing::{debug, info};

use crate::decode::decode_output;
use crate::error::ParseError;
use crate::process::{ParserCommand, ParserExecutor, ParserOutput, ProcessExecutor, SourceInput};
use crate::symbols::ExtractionResult;

/// Tracing target for extraction.
const EXTRACT_TARGET: &str = "pkgscan_parsing::extractor";

/// Exit status the parser uses to report input it cannot parse.
pub const SYNTAX_ERROR_EXIT_CODE: i32 = 33;

/// Status reported in [`ParseError::ParserFailed`] for a parser killed by
/// a signal.
const SIGNALLED_STATUS: i32 = -1;

/// Extracts identifiers, literals, and comments from source code.
///
/// # Example
///
/// ```
/// use pkgscan_parsing::{
///     ParseError, ParserCommand, ParserExecutor, ParserOutput, SourceInput, SymbolExtractor,
/// };
///
/// struct SyntaxError;
///
/// impl ParserExecutor for SyntaxError {
///     fn run(&self, _: &ParserCommand, _: &SourceInput) -> Result<ParserOutput, ParseError> {
///         Ok(ParserOutput::new(Some(33), "", "Unexpected token"))
///     }
/// }
///
/// let extractor = SymbolExtractor::with_executor(ParserCommand::new("node"), SyntaxError);
/// let result = extractor.extract(&SourceInput::source("<html>")).unwrap();
/// assert!(!result.is_valid());
/// ```
#[derive(Debug, Clone)]
pub struct SymbolExtractor<E = ProcessExecutor> {
    command: ParserCommand,
    executor: E,
}

impl SymbolExtractor {
    /// Creates an extractor that runs `command` as a local process.
    #[must_use]
    pub const fn new(command: ParserCommand) -> Self {
        Self::with_executor(command, ProcessExecutor)
    }
}

impl<E> SymbolExtractor<E> {
    /// Creates an extractor with a custom executor.
    #[must_use]
    pub const fn with_executor(command: ParserCommand, executor: E) -> Self {
        Self { command, executor }
    }

    /// Parser command used for each run.
    #[must_use]
    pub const fn command(&self) -> &ParserCommand {
        &self.command
    }
}

impl<E: ParserExecutor> SymbolExtractor<E> {
    /// Runs the parser on `input` and returns its symbols.
    ///
    /// A syntax error is not a failure: it yields a result whose
    /// [`is_valid`](ExtractionResult::is_valid) is false.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Spawn`] or [`ParseError::Io`] when the parser
    /// cannot be run, [`ParseError::ParserFailed`] for any other non-zero
    /// exit, and [`ParseError::Decode`] when a clean exit printed something
    /// other than a JSON array.
    pub fn extract(&self, input: &SourceInput) -> Result<ExtractionResult, ParseError> {
        let output = self.run_raw(input)?;
        self.interpret(&output)
    }

    /// Runs the parser without interpreting its exit status.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Spawn`] or [`ParseError::Io`] when the parser
    /// cannot be run.
    pub fn run_raw(&self, input: &SourceInput) -> Result<ParserOutput, ParseError> {
        self.executor.run(&self.command, input)
    }

    /// Maps a finished parser run onto an extraction result.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::ParserFailed`] or [`ParseError::Decode`] as for
    /// [`extract`](Self::extract).
    pub fn interpret(&self, output: &ParserOutput) -> Result<ExtractionResult, ParseError> {
        match output.status() {
            Some(0) => {
                let result = decode_output(output.stdout())?;
                debug!(
                    target: EXTRACT_TARGET,
                    identifiers = result.identifiers().len(),
                    literals = result.literals().len(),
                    comments = result.comments().len(),
                    record_errors = result.record_errors().len(),
                    "decoded parser output"
                );
                Ok(result)
            }
            Some(SYNTAX_ERROR_EXIT_CODE) => {
                info!(
                    target: EXTRACT_TARGET,
                    stderr = output.stderr().trim(),
                    "input is not syntactically valid"
                );
                Ok(ExtractionResult::invalid())
            }
            status => Err(ParseError::ParserFailed {
                program: self.command.program().to_path_buf(),
                status: status.unwrap_or(SIGNALLED_STATUS),
                stderr: output.stderr().trim().to_owned(),
            }),
        }
    }
}
