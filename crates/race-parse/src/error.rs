//! Structural vs. content error split (spec.md §7): structural errors abort
//! the current token and are not recoverable by the caller without
//! discarding the rest of the input; content errors are reported but the
//! cursor is advanced past the bad field so parsing can continue.

use std::fmt;

/// Maximum width, in bytes, of the diagnostic context snippet carried by a
/// [`StructuralParseError`].
pub const CONTEXT_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralParseError {
    pub message: String,
    pub pos: usize,
    /// Up to `CONTEXT_WINDOW` bytes of input starting at `pos`, lossily
    /// decoded for display.
    pub context: String,
}

impl StructuralParseError {
    pub fn new(message: impl Into<String>, pos: usize, buf: &[u8]) -> Self {
        let end = (pos + CONTEXT_WINDOW).min(buf.len());
        let start = pos.min(buf.len());
        let context = String::from_utf8_lossy(&buf[start..end]).into_owned();
        Self {
            message: message.into(),
            pos,
            context,
        }
    }
}

impl fmt::Display for StructuralParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "structural parse error at byte {}: {} (near {:?})",
            self.pos, self.message, self.context
        )
    }
}

impl std::error::Error for StructuralParseError {}

/// Either a structural fault (fatal for the current input) or a content
/// fault (the slice was malformed but the caller may continue past it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Structural(StructuralParseError),
    Content(race_common::ContentParseError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Structural(e) => e.fmt(f),
            ParseError::Content(e) => write!(f, "content parse error: {e}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<StructuralParseError> for ParseError {
    fn from(e: StructuralParseError) -> Self {
        ParseError::Structural(e)
    }
}

impl From<race_common::ContentParseError> for ParseError {
    fn from(e: race_common::ContentParseError) -> Self {
        ParseError::Content(e)
    }
}
