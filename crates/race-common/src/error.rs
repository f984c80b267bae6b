//! Error taxonomy shared by the conversion routines in this crate.
//!
//! Mirrors the `kind` + `message` + `context` shape used throughout the
//! rest of the workspace: every error carries a machine-matchable kind, an
//! optional human message, and a short positional context so a caller can
//! print a useful diagnostic without re-deriving the offset itself.

use std::fmt;

/// The kind of malformed content a numeric/boolean conversion rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentErrorKind {
    /// Empty input where a value was required.
    Empty,
    /// A non-digit byte appeared where a digit was expected.
    InvalidDigit,
    /// The decoded integer does not fit in the target width.
    Overflow,
    /// A sign, decimal point, or exponent was malformed or duplicated.
    MalformedNumber,
    /// The token did not match any recognized boolean spelling.
    InvalidBoolean,
    /// A `\uXXXX` escape was not four valid hex digits.
    InvalidUnicodeEscape,
    /// An escape sequence used an unrecognized character after `\`.
    UnknownEscape,
    /// Trailing bytes remained after a value was otherwise fully parsed.
    TrailingGarbage,
}

impl fmt::Display for ContentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty input",
            Self::InvalidDigit => "invalid digit",
            Self::Overflow => "numeric overflow",
            Self::MalformedNumber => "malformed number",
            Self::InvalidBoolean => "invalid boolean literal",
            Self::InvalidUnicodeEscape => "invalid \\u escape",
            Self::UnknownEscape => "unknown escape sequence",
            Self::TrailingGarbage => "trailing garbage after value",
        })
    }
}

/// Raised by the conversion helpers on [`crate::Slice`] when the bytes in
/// range do not form a valid value of the requested type.
///
/// Carries the offending text so the caller can build a diagnostic without
/// re-slicing the backing buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentParseError {
    pub kind: ContentErrorKind,
    pub text: String,
    pub message: Option<String>,
}

impl ContentParseError {
    pub fn new(kind: ContentErrorKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}

impl fmt::Display for ContentParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.kind, self.text)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ContentParseError {}
