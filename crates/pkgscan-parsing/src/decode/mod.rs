//! Conversion of parser output into an [`ExtractionResult`].
//!
//! Decoding happens in three stages. The output is first read as an array
//! of neutral [`Value`]s; a malformed document is the only hard failure.
//! Each element is then read as a [`SymbolRecord`], and finally validated
//! against the payload shape its kind requires. Failures in the last two
//! stages are recorded as [`RecordError`]s so one bad record never costs the
//! rest of the batch.

use num_bigint::{BigInt, BigUint, Sign};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::error::ParseError;
use crate::protocol::{SymbolKind, SymbolRecord};
use crate::symbols::{
    ExtractionResult, IdentifierKind, LiteralValue, ParsedComment, ParsedIdentifier,
    ParsedLiteral, RecordError, ValueKind,
};

/// Tracing target for decoding diagnostics.
const DECODE_TARGET: &str = "pkgscan_parsing::decode";

/// Literal category whose text payloads may carry big integers.
///
/// Integers beyond the parser's number precision cannot travel as JSON
/// numbers, so the parser sends them as text. Until the wire format grows a
/// dedicated tag, a text payload on a `Numeric` literal is the signal.
pub const NUMERIC_LITERAL: &str = "Numeric";

/// Key in `extra` holding the literal's source text.
const RAW_KEY: &str = "raw";
/// Key in `extra` flagging literals inside array literals.
const ARRAY_KEY: &str = "array";

/// Payload shape violations found while validating one record.
#[derive(Debug, Error)]
enum ShapeError {
    #[error("{field} must be a string, found {found}")]
    NotText {
        field: &'static str,
        found: ValueKind,
    },
    #[error("{field} is missing")]
    Missing { field: &'static str },
}

enum Symbol {
    Identifier(ParsedIdentifier),
    Literal(ParsedLiteral),
    Comment(ParsedComment),
}

/// Decodes the standard output of a cleanly exited parser.
///
/// ```
/// use pkgscan_parsing::decode::decode_output;
///
/// let output = r#"[
///   {"type": "Identifier", "subtype": "Function", "data": "fetch", "pos": [1, 0]},
///   {"type": "Identifier", "subtype": "Other", "data": "x", "pos": [1, 6]}
/// ]"#;
/// let result = decode_output(output).unwrap();
/// assert!(result.is_valid());
/// assert_eq!(result.identifiers().len(), 1);
/// ```
///
/// # Errors
///
/// Returns [`ParseError::Decode`] when `output` is not a UTF-8 JSON array.
pub fn decode_output<T>(output: &T) -> Result<ExtractionResult, ParseError>
where
    T: AsRef<[u8]> + ?Sized,
{
    let elements: Vec<Value> =
        serde_json::from_slice(output.as_ref()).map_err(ParseError::Decode)?;
    let mut result = ExtractionResult::valid();

    for (index, element) in elements.into_iter().enumerate() {
        let record: SymbolRecord = match serde_json::from_value(element) {
            Ok(record) => record,
            Err(error) => {
                reject(&mut result, RecordError::new(index, None, error.to_string()));
                continue;
            }
        };

        match decode_record(&record) {
            Ok(Some(Symbol::Identifier(identifier))) => result.push_identifier(identifier),
            Ok(Some(Symbol::Literal(literal))) => result.push_literal(literal),
            Ok(Some(Symbol::Comment(comment))) => result.push_comment(comment),
            Ok(None) => {}
            Err(error) => reject(
                &mut result,
                RecordError::new(index, Some(record.kind().clone()), error.to_string()),
            ),
        }
    }

    Ok(result)
}

fn reject(result: &mut ExtractionResult, error: RecordError) {
    warn!(
        target: DECODE_TARGET,
        index = error.index(),
        kind = ?error.kind(),
        message = error.message(),
        "skipping malformed parser record"
    );
    result.push_record_error(error);
}

fn decode_record(record: &SymbolRecord) -> Result<Option<Symbol>, ShapeError> {
    match record.kind() {
        SymbolKind::Identifier => decode_identifier(record),
        SymbolKind::Literal => decode_literal(record).map(|literal| Some(Symbol::Literal(literal))),
        SymbolKind::Comment => {
            let text = text_payload(record.data(), "data")?;
            Ok(Some(Symbol::Comment(ParsedComment::new(
                record.subtype(),
                text,
                record.pos(),
            ))))
        }
        SymbolKind::Info | SymbolKind::Error => Ok(None),
        SymbolKind::Unrecognised(tag) => {
            warn!(
                target: DECODE_TARGET,
                kind = tag.as_str(),
                "unrecognised symbol type"
            );
            Ok(None)
        }
    }
}

fn decode_identifier(record: &SymbolRecord) -> Result<Option<Symbol>, ShapeError> {
    let kind = IdentifierKind::classify(record.subtype());
    if !kind.is_reported() {
        return Ok(None);
    }
    let name = text_payload(record.data(), "data")?;
    Ok(Some(Symbol::Identifier(ParsedIdentifier::new(
        kind,
        name,
        record.pos(),
    ))))
}

fn decode_literal(record: &SymbolRecord) -> Result<ParsedLiteral, ShapeError> {
    let raw = match record.extra(RAW_KEY) {
        Some(raw) => text_payload(raw, "extra.raw")?,
        None => return Err(ShapeError::Missing { field: "extra.raw" }),
    };
    let in_array = matches!(record.extra(ARRAY_KEY), Some(Value::Bool(true)));

    let value = match record.data() {
        Value::String(text) if record.subtype() == NUMERIC_LITERAL => parse_big_integer(text)
            .map_or_else(|| LiteralValue::String(text.clone()), LiteralValue::BigInteger),
        other => LiteralValue::from(other.clone()),
    };

    Ok(ParsedLiteral::new(
        record.subtype(),
        value,
        raw,
        in_array,
        record.pos(),
    ))
}

fn text_payload<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ShapeError> {
    value.as_str().ok_or(ShapeError::NotText {
        field,
        found: ValueKind::of(value),
    })
}

/// Parses integer literal text of any size.
///
/// The base follows the source prefix: `0x` hexadecimal, `0o` octal, `0b`
/// binary, a legacy leading `0` octal, otherwise decimal. A leading sign is
/// accepted, as are `_` separators between digits or between the prefix and
/// the first digit, so `0x_FF` and `0_17` both parse.
///
/// Two additions go beyond plain integer syntax: surrounding whitespace is
/// ignored and a trailing BigInt `n` suffix is dropped, so raw JavaScript
/// literals such as `9007199254740993n` parse as written.
///
/// ```
/// use pkgscan_parsing::decode::parse_big_integer;
///
/// let big = parse_big_integer("0x1_0000_0000_0000_0000").unwrap();
/// assert_eq!(big.to_string(), "18446744073709551616");
/// assert!(parse_big_integer("1.5e300").is_none());
/// ```
#[must_use]
pub fn parse_big_integer(text: &str) -> Option<BigInt> {
    let trimmed = text.trim();
    let unsuffixed = trimmed.strip_suffix('n').unwrap_or(trimmed);
    let (sign, unsigned) = match unsuffixed.strip_prefix('-') {
        Some(rest) => (Sign::Minus, rest),
        None => (
            Sign::Plus,
            unsuffixed.strip_prefix('+').unwrap_or(unsuffixed),
        ),
    };

    let (radix, prefixed) = split_radix(unsigned);
    let body = match prefixed {
        Prefixed::Yes(rest) => rest.strip_prefix('_').unwrap_or(rest),
        Prefixed::No(rest) => rest,
    };
    if body.starts_with('_') || body.ends_with('_') || body.contains("__") {
        return None;
    }
    let digits: String = body.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    BigUint::parse_bytes(digits.as_bytes(), radix)
        .map(|magnitude| BigInt::from_biguint(sign, magnitude))
}

/// Digits left after the base prefix, if there was one.
enum Prefixed<'a> {
    Yes(&'a str),
    No(&'a str),
}

fn split_radix(text: &str) -> (u32, Prefixed<'_>) {
    const PREFIXES: [(&str, u32); 6] = [
        ("0x", 16),
        ("0X", 16),
        ("0o", 8),
        ("0O", 8),
        ("0b", 2),
        ("0B", 2),
    ];
    for (prefix, radix) in PREFIXES {
        if let Some(body) = text.strip_prefix(prefix) {
            return (radix, Prefixed::Yes(body));
        }
    }
    match text.strip_prefix('0') {
        Some(body) if !body.is_empty() => (8, Prefixed::Yes(body)),
        _ => (10, Prefixed::No(text)),
    }
}
