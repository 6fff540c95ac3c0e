//! Typed symbols produced from the parser's output.

use num_bigint::BigInt;
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use strum::{Display, EnumString};

use crate::protocol::{Position, SymbolKind};

/// Role of an identifier, as classified by the parser's `subtype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
pub enum IdentifierKind {
    /// Function or method name.
    Function,
    /// Variable binding.
    Variable,
    /// Function parameter.
    Parameter,
    /// Class name.
    Class,
    /// Member access (`obj.member`).
    Member,
    /// Object literal property key.
    Property,
    /// Label of a labelled statement.
    StatementLabel,
    /// Known to the parser but not interesting to analysis.
    Other,
    /// Not a subtype this crate recognises.
    Unknown,
}

impl IdentifierKind {
    /// Maps a wire subtype onto the classification table.
    ///
    /// ```
    /// use pkgscan_parsing::IdentifierKind;
    ///
    /// assert_eq!(IdentifierKind::classify("Function"), IdentifierKind::Function);
    /// assert_eq!(IdentifierKind::classify("Decorator"), IdentifierKind::Unknown);
    /// ```
    #[must_use]
    pub fn classify(subtype: &str) -> Self {
        subtype.parse().unwrap_or(Self::Unknown)
    }

    /// Whether identifiers of this kind belong in an extraction result.
    #[must_use]
    pub const fn is_reported(self) -> bool {
        !matches!(self, Self::Other | Self::Unknown)
    }
}

/// Representation a literal value took while decoding.
///
/// Diagnostic only; analysis should match on [`LiteralValue`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON null.
    Null,
    /// Arbitrary-precision integer recovered from text.
    BigInteger,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl ValueKind {
    /// Kind of a raw JSON value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

/// Decoded value of a literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// `null`.
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// A number within JSON precision.
    Number(Number),
    /// Text, including numeric text that is not an integer.
    String(String),
    /// An integer too large for JSON numbers, serialised as decimal text.
    BigInteger(#[serde(serialize_with = "serialize_decimal")] BigInt),
    /// Any other JSON structure, kept as-is.
    Other(Value),
}

impl LiteralValue {
    /// Representation used for this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::BigInteger(_) => ValueKind::BigInteger,
            Self::Other(value) => ValueKind::of(value),
        }
    }

    /// The text when the value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// The integer when the value was recovered as a big integer.
    #[must_use]
    pub const fn as_big_integer(&self) -> Option<&BigInt> {
        match self {
            Self::BigInteger(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for LiteralValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Boolean(flag),
            Value::Number(number) => Self::Number(number),
            Value::String(text) => Self::String(text),
            other @ (Value::Array(_) | Value::Object(_)) => Self::Other(other),
        }
    }
}

fn serialize_decimal<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// An identifier worth reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedIdentifier {
    kind: IdentifierKind,
    name: String,
    pos: Position,
}

impl ParsedIdentifier {
    /// Creates an identifier record.
    #[must_use]
    pub fn new(kind: IdentifierKind, name: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            name: name.into(),
            pos,
        }
    }

    /// Identifier role.
    #[must_use]
    pub const fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// Identifier text.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Source position.
    #[must_use]
    pub const fn pos(&self) -> Position {
        self.pos
    }
}

/// A literal found in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedLiteral {
    kind: String,
    value: LiteralValue,
    decoded_as: ValueKind,
    raw: String,
    in_array: bool,
    pos: Position,
}

impl ParsedLiteral {
    /// Creates a literal record; the decoded representation is taken from
    /// `value`.
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        value: LiteralValue,
        raw: impl Into<String>,
        in_array: bool,
        pos: Position,
    ) -> Self {
        Self {
            kind: kind.into(),
            decoded_as: value.kind(),
            value,
            raw: raw.into(),
            in_array,
            pos,
        }
    }

    /// Literal category as reported by the parser, e.g. `String`.
    #[must_use]
    pub const fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// Decoded value.
    #[must_use]
    pub const fn value(&self) -> &LiteralValue {
        &self.value
    }

    /// Representation the value took while decoding.
    #[must_use]
    pub const fn decoded_as(&self) -> ValueKind {
        self.decoded_as
    }

    /// Literal text exactly as written in the source.
    #[must_use]
    pub const fn raw(&self) -> &str {
        self.raw.as_str()
    }

    /// Whether the literal is an element of an array literal.
    #[must_use]
    pub const fn in_array(&self) -> bool {
        self.in_array
    }

    /// Source position.
    #[must_use]
    pub const fn pos(&self) -> Position {
        self.pos
    }
}

/// A comment found in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedComment {
    kind: String,
    text: String,
    pos: Position,
}

impl ParsedComment {
    /// Creates a comment record.
    #[must_use]
    pub fn new(kind: impl Into<String>, text: impl Into<String>, pos: Position) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            pos,
        }
    }

    /// Comment style as reported by the parser, e.g. `Block`.
    #[must_use]
    pub const fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// Comment text.
    #[must_use]
    pub const fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Source position.
    #[must_use]
    pub const fn pos(&self) -> Position {
        self.pos
    }
}

/// A record that was skipped because it broke the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    index: usize,
    kind: Option<SymbolKind>,
    message: String,
}

impl RecordError {
    pub(crate) fn new(index: usize, kind: Option<SymbolKind>, message: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            message: message.into(),
        }
    }

    /// Zero-based position of the record in the parser output.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The record's kind, when its envelope could be read.
    #[must_use]
    pub const fn kind(&self) -> Option<&SymbolKind> {
        self.kind.as_ref()
    }

    /// What was wrong with the record.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Everything extracted from one source input.
///
/// Sequences keep the order in which the parser printed the records.
/// An invalid result, produced when the parser reports a syntax error,
/// has every sequence empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    valid: bool,
    identifiers: Vec<ParsedIdentifier>,
    literals: Vec<ParsedLiteral>,
    comments: Vec<ParsedComment>,
    record_errors: Vec<RecordError>,
}

impl ExtractionResult {
    /// Result for input the parser rejected as syntactically invalid.
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    pub(crate) fn valid() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// False exactly when the parser reported a syntax error.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Reported identifiers in output order.
    #[must_use]
    pub fn identifiers(&self) -> &[ParsedIdentifier] {
        &self.identifiers
    }

    /// Literals in output order.
    #[must_use]
    pub fn literals(&self) -> &[ParsedLiteral] {
        &self.literals
    }

    /// Comments in output order.
    #[must_use]
    pub fn comments(&self) -> &[ParsedComment] {
        &self.comments
    }

    /// Records skipped for violating the wire contract.
    #[must_use]
    pub fn record_errors(&self) -> &[RecordError] {
        &self.record_errors
    }

    pub(crate) fn push_identifier(&mut self, identifier: ParsedIdentifier) {
        self.identifiers.push(identifier);
    }

    pub(crate) fn push_literal(&mut self, literal: ParsedLiteral) {
        self.literals.push(literal);
    }

    pub(crate) fn push_comment(&mut self, comment: ParsedComment) {
        self.comments.push(comment);
    }

    pub(crate) fn push_record_error(&mut self, error: RecordError) {
        self.record_errors.push(error);
    }
}
