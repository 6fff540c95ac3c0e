//! Running the parser as a child process.
//!
//! [`ProcessExecutor`] implements [`ParserExecutor`] with
//! [`std::process::Command`]. When the source is held in memory it is
//! written to the parser's stdin, which is then closed before the executor
//! blocks on the parser's output. Without the close the parser would wait
//! for more input forever.
//!
//! A parser may reject the source and exit before reading all of it. The
//! resulting broken pipe is not an error: the exit status decides the
//! outcome.

use std::ffi::OsString;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use tracing::debug;

use crate::error::ParseError;

/// Tracing target for parser process operations.
const PROCESS_TARGET: &str = "pkgscan_parsing::process";

/// Program and leading arguments used to start the parser.
///
/// ```
/// use pkgscan_parsing::ParserCommand;
///
/// let command = ParserCommand::new("node").arg("parser.js");
/// assert_eq!(command.program().to_str(), Some("node"));
/// assert_eq!(command.args().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ParserCommand {
    /// Creates a command that runs `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends a leading argument, such as the parser script for an
    /// interpreter.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Leading arguments, before any source path.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// Source handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// A file on disk, passed as the final argument.
    File(PathBuf),
    /// Source text, streamed to standard input.
    Source(String),
}

impl SourceInput {
    /// Source read from a file on disk.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Source held in memory.
    #[must_use]
    pub fn source(text: impl Into<String>) -> Self {
        Self::Source(text.into())
    }

    /// Picks the effective input: the file when one is given, otherwise the
    /// in-memory source, otherwise empty source.
    ///
    /// ```
    /// use pkgscan_parsing::SourceInput;
    ///
    /// let input = SourceInput::select(Some("index.js".into()), Some("ignored".into()));
    /// assert_eq!(input, SourceInput::file("index.js"));
    /// assert_eq!(SourceInput::select(None, None), SourceInput::source(""));
    /// ```
    #[must_use]
    pub fn select(file: Option<PathBuf>, source: Option<String>) -> Self {
        match file {
            Some(path) => Self::File(path),
            None => Self::Source(source.unwrap_or_default()),
        }
    }
}

/// What the parser process left behind.
///
/// Standard output is kept as raw bytes so that invalid UTF-8 surfaces as a
/// decode error; standard error is only ever shown to people and is
/// converted lossily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOutput {
    status: Option<i32>,
    stdout: Vec<u8>,
    stderr: String,
}

impl ParserOutput {
    /// Creates an output record; `status` is `None` when the process was
    /// killed by a signal.
    #[must_use]
    pub fn new(status: Option<i32>, stdout: impl Into<Vec<u8>>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Exit code, or `None` after termination by signal.
    #[must_use]
    pub const fn status(&self) -> Option<i32> {
        self.status
    }

    /// Captured standard output.
    #[must_use]
    pub const fn stdout(&self) -> &[u8] {
        self.stdout.as_slice()
    }

    /// Captured standard error.
    #[must_use]
    pub const fn stderr(&self) -> &str {
        self.stderr.as_str()
    }
}

/// Runs the parser against one input.
///
/// The production implementation is [`ProcessExecutor`]; tests substitute
/// canned outputs.
pub trait ParserExecutor {
    /// Runs `command` on `input` and returns the raw process output,
    /// whatever the exit status.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Spawn`] when the process cannot be started and
    /// [`ParseError::Io`] when streaming the source or collecting output
    /// fails.
    fn run(&self, command: &ParserCommand, input: &SourceInput) -> Result<ParserOutput, ParseError>;
}

/// Runs the parser as a local child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ParserExecutor for ProcessExecutor {
    fn run(&self, command: &ParserCommand, input: &SourceInput) -> Result<ParserOutput, ParseError> {
        let mut process = Command::new(command.program());
        process
            .args(command.args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match input {
            SourceInput::File(path) => {
                process.arg(path).stdin(Stdio::null());
            }
            SourceInput::Source(_) => {
                process.stdin(Stdio::piped());
            }
        }

        debug!(
            target: PROCESS_TARGET,
            program = %command.program().display(),
            from_file = matches!(input, SourceInput::File(_)),
            "spawning parser"
        );

        let mut child = process.spawn().map_err(|err| ParseError::Spawn {
            program: command.program().to_path_buf(),
            source: Arc::new(err),
        })?;

        if let SourceInput::Source(text) = input {
            match write_source(&mut child, text) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    debug!(
                        target: PROCESS_TARGET,
                        program = %command.program().display(),
                        "parser closed stdin before reading all source"
                    );
                }
                Err(err) => {
                    drop(child.kill());
                    drop(child.wait());
                    return Err(ParseError::Io {
                        program: command.program().to_path_buf(),
                        action: "write source to",
                        source: Arc::new(err),
                    });
                }
            }
        }

        let output = child.wait_with_output().map_err(|err| ParseError::Io {
            program: command.program().to_path_buf(),
            action: "collect output from",
            source: Arc::new(err),
        })?;

        debug!(
            target: PROCESS_TARGET,
            program = %command.program().display(),
            status = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "parser exited"
        );

        Ok(ParserOutput::new(
            output.status.code(),
            output.stdout,
            String::from_utf8_lossy(&output.stderr),
        ))
    }
}

/// Writes the whole source to the child's stdin and closes it.
fn write_source(child: &mut Child, text: &str) -> io::Result<()> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("stdin was not captured"))?;
    stdin.write_all(text.as_bytes())?;
    stdin.flush()
}
