//! Wire format printed by the parser.
//!
//! The parser prints one JSON array whose elements look like:
//!
//! ```json
//! {"type": "Literal", "subtype": "String", "data": "http://x",
//!  "pos": [3, 12], "extra": {"raw": "'http://x'", "array": true}}
//! ```
//!
//! `data` and `extra` change shape with `type` and `subtype`, so they stay
//! as [`serde_json::Value`] here and are validated per kind by
//! [`decode`](crate::decode).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Symbol kind tag carried in the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SymbolKind {
    /// A named binding or reference.
    Identifier,
    /// A literal value.
    Literal,
    /// A source comment.
    Comment,
    /// Parser diagnostics; currently ignored.
    Info,
    /// Parser-reported recoverable errors; currently ignored.
    Error,
    /// A tag this crate does not know.
    Unrecognised(String),
}

impl From<String> for SymbolKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Identifier" => Self::Identifier,
            "Literal" => Self::Literal,
            "Comment" => Self::Comment,
            "Info" => Self::Info,
            "Error" => Self::Error,
            _ => Self::Unrecognised(tag),
        }
    }
}

impl From<SymbolKind> for String {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Identifier => Self::from("Identifier"),
            SymbolKind::Literal => Self::from("Literal"),
            SymbolKind::Comment => Self::from("Comment"),
            SymbolKind::Info => Self::from("Info"),
            SymbolKind::Error => Self::from("Error"),
            SymbolKind::Unrecognised(tag) => tag,
        }
    }
}

/// Two-integer source location reported by the parser.
///
/// The parser decides what the pair means (line and column for the
/// bundled JavaScript parser); this crate only carries it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position([i64; 2]);

impl Position {
    /// Creates a position from its two components.
    #[must_use]
    pub const fn new(line: i64, column: i64) -> Self {
        Self([line, column])
    }

    /// First component, the line for line/column parsers.
    #[must_use]
    pub const fn line(self) -> i64 {
        self.0[0]
    }

    /// Second component, the column for line/column parsers.
    #[must_use]
    pub const fn column(self) -> i64 {
        self.0[1]
    }
}

/// One element of the parser's output array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SymbolRecord {
    #[serde(rename = "type")]
    kind: SymbolKind,
    #[serde(default)]
    subtype: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    pos: Position,
    #[serde(default)]
    extra: Option<Map<String, Value>>,
}

impl SymbolRecord {
    /// The record's kind tag.
    #[must_use]
    pub const fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    /// Kind-specific subtype, empty when absent.
    #[must_use]
    pub const fn subtype(&self) -> &str {
        self.subtype.as_str()
    }

    /// Kind-specific payload, `null` when absent.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Source position, `[0, 0]` when absent.
    #[must_use]
    pub const fn pos(&self) -> Position {
        self.pos
    }

    /// Looks up an entry of the `extra` map; absent and `null` maps have no
    /// entries.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.as_ref().and_then(|extra| extra.get(key))
    }
}
