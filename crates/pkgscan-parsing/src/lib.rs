//! Source symbol extraction through an external parser.
//!
//! `pkgscan-parsing` runs a source-code parser as a child process, reads the
//! JSON symbol stream it prints, and turns it into typed identifiers,
//! literals, and comments. The parser is trusted to print JSON when it exits
//! cleanly and nothing more.
//!
//! # Protocol
//!
//! The parser receives the source either as a trailing file-path argument
//! or on standard input, which is closed once the source has been written.
//! It answers through its exit status:
//!
//! - `0`: standard output holds a JSON array of symbol records (see
//!   [`protocol`]);
//! - [`SYNTAX_ERROR_EXIT_CODE`]: the input does not parse, which usually
//!   means it is not source in the parser's language at all. This is a
//!   classification, reported as an invalid [`ExtractionResult`];
//! - anything else: the parser failed, reported as
//!   [`ParseError::ParserFailed`] with its standard error attached.
//!
//! # Example
//!
//! ```rust,no_run
//! use pkgscan_parsing::{ParserCommand, SourceInput, SymbolExtractor};
//!
//! # fn main() -> Result<(), pkgscan_parsing::ParseError> {
//! let command = ParserCommand::new("/usr/bin/node").arg("/opt/pkgscan/parser.js");
//! let extractor = SymbolExtractor::new(command);
//!
//! let result = extractor.extract(&SourceInput::source("const url = 'http://x';"))?;
//! if result.is_valid() {
//!     for literal in result.literals() {
//!         println!("{} {}", literal.kind(), literal.raw());
//!     }
//! }
//! # Ok(()) }
//! ```

pub mod decode;
pub mod error;
pub mod extractor;
pub mod process;
pub mod protocol;
pub mod symbols;

#[cfg(test)]
mod tests;

pub use self::error::ParseError;
pub use self::extractor::{SYNTAX_ERROR_EXIT_CODE, SymbolExtractor};
pub use self::process::{ParserCommand, ParserExecutor, ParserOutput, ProcessExecutor, SourceInput};
pub use self::protocol::{Position, SymbolKind, SymbolRecord};
pub use self::symbols::{
    ExtractionResult, IdentifierKind, LiteralValue, ParsedComment, ParsedIdentifier,
    ParsedLiteral, RecordError, ValueKind,
};
