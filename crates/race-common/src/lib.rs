//! Borrowed byte-slice primitive, range stack, glob-path matcher, and fast
//! numeric/boolean conversions backing the rest of the RACE parser core.
//!
//! This crate has no runtime dependencies: it is the leaf layer every other
//! `race-*` crate builds on.

mod error;
mod glob;
mod range_stack;
mod slice;

pub use error::{ContentErrorKind, ContentParseError};
pub use glob::{GlobPath, Segment};
pub use range_stack::{Range, RangeStack};
pub use slice::{hash_bytes, IntRange, Slice};
