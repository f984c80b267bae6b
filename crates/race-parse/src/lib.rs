//! Zero-allocation pull parsers for XML, CSV and JSON over a borrowed byte
//! buffer, plus the growable [`LineBuffer`] used to stream records in from
//! a reader a chunk at a time.
//!
//! None of the parsers here build an intermediate token stream or tree —
//! each exposes a cursor that the caller drives forward one element,
//! attribute, field, or member at a time, borrowing directly from the
//! input buffer via [`race_common::Slice`].

mod csv;
mod error;
mod json;
mod line_buffer;
mod xml;

pub use csv::CsvPullParser;
pub use error::{ParseError, StructuralParseError, CONTEXT_WINDOW};
pub use json::{JsonPullParser, ValueKind};
pub use line_buffer::LineBuffer;
pub use xml::XmlPullParser;
