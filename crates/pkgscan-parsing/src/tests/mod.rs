//! Crate-level integration and BDD tests.

use crate::error::ParseError;
use crate::extractor::SymbolExtractor;
use crate::process::{ParserCommand, ParserExecutor, ParserOutput, SourceInput};


/// Executor that answers every run with the same output.
struct CannedExecutor(ParserOutput);

impl ParserExecutor for CannedExecutor {
    fn run(
        &self,
        _command: &ParserCommand,
        _input: &SourceInput,
    ) -> Result<ParserOutput, ParseError> {
        Ok(self.0.clone())
    }
}

#[test]
fn end_to_end_extraction_with_canned_parser() {
    let stdout = r#"[
        {"type": "Comment", "subtype": "Line", "data": " postinstall hook", "pos": [1, 0]},
        {"type": "Identifier", "subtype": "Function", "data": "run", "pos": [2, 9]},
        {"type": "Literal", "subtype": "Numeric", "data": "340282366920938463463374607431768211456",
         "pos": [3, 10], "extra": {"raw": "340282366920938463463374607431768211456n", "array": true}}
    ]"#;
    let extractor = SymbolExtractor::with_executor(
        ParserCommand::new("node"),
        CannedExecutor(ParserOutput::new(Some(0), stdout, "")),
    );

    let result = extractor
        .extract(&SourceInput::source("ignored"))
        .expect("extract");

    assert_eq!(result.comments().len(), 1);
    assert_eq!(result.identifiers().len(), 1);
    let literal = result.literals().first().expect("literal");
    assert!(literal.in_array());
    assert_eq!(
        literal.value().as_big_integer().map(ToString::to_string).as_deref(),
        Some("340282366920938463463374607431768211456")
    );

    let json = serde_json::to_value(&result).expect("serialise");
    assert_eq!(
        json["literals"][0]["value"],
        serde_json::json!("340282366920938463463374607431768211456")
    );
    assert_eq!(json["literals"][0]["decoded_as"], serde_json::json!("big_integer"));
}

#[test]
fn parser_that_rejects_unread_source_yields_an_invalid_result() {
    let scripts = tempfile::TempDir::new().expect("temp dir");
    let script = scripts.path().join("reject.sh");
    std::fs::write(&script, "exit 33\n").expect("write script");
    let extractor = SymbolExtractor::new(ParserCommand::new("/bin/sh").arg(script));
    let source = "<?php ".repeat(1024 * 1024);

    let result = extractor
        .extract(&SourceInput::source(source))
        .expect("syntax errors are not failures");

    assert!(!result.is_valid());
    assert!(result.identifiers().is_empty());
}

#[test]
fn parser_printing_invalid_utf8_is_a_decode_error() {
    let extractor = SymbolExtractor::with_executor(
        ParserCommand::new("node"),
        CannedExecutor(ParserOutput::new(Some(0), b"[\"\xff\"]".to_vec(), "")),
    );

    let err = extractor
        .extract(&SourceInput::source("ignored"))
        .expect_err("should fail");

    assert!(matches!(err, ParseError::Decode(_)), "unexpected error: {err}");
}
