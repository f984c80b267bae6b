//! Pull parser for a JSON document, exposing object members and array
//! elements as iterator-style callbacks over borrowed slices rather than
//! building an in-memory value tree.

use race_common::Slice;

use crate::error::StructuralParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

/// Streaming JSON reader. Positioned at a single JSON value at a time;
/// [`Self::foreach_member_in_current_object`] and
/// [`Self::foreach_element_in_current_array`] recurse into children by
/// handing the callback a fresh cursor view, matching the structural
/// recursion of the document itself rather than flattening it into events.
pub struct JsonPullParser<'a> {
    buf: &'a [u8],
    idx: usize,
}

impl<'a> JsonPullParser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        let mut p = Self { buf, idx: 0 };
        p.skip_ws();
        p
    }

    fn err(&self, msg: impl Into<String>, pos: usize) -> StructuralParseError {
        StructuralParseError::new(msg, pos, self.buf)
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.idx).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.idx += 1;
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), StructuralParseError> {
        if self.peek() == Some(b) {
            self.idx += 1;
            Ok(())
        } else {
            Err(self.err(format!("expected '{}'", b as char), self.idx))
        }
    }

    /// The kind of the value the cursor is currently positioned on.
    pub fn current_kind(&self) -> Result<ValueKind, StructuralParseError> {
        match self.peek() {
            Some(b'{') => Ok(ValueKind::Object),
            Some(b'[') => Ok(ValueKind::Array),
            Some(b'"') => Ok(ValueKind::String),
            Some(b't') | Some(b'f') => Ok(ValueKind::Bool),
            Some(b'n') => Ok(ValueKind::Null),
            Some(b) if b == b'-' || b.is_ascii_digit() => Ok(ValueKind::Number),
            _ => Err(self.err("expected a JSON value", self.idx)),
        }
    }

    pub fn is_null(&self) -> bool {
        self.buf[self.idx..].starts_with(b"null")
    }

    /// Raw (still-quoted, still-escaped) content of a string value's quotes.
    fn scan_quoted(&mut self) -> Result<Slice<'a>, StructuralParseError> {
        self.expect(b'"')?;
        let start = self.idx;
        loop {
            match self.peek() {
                None => return Err(self.err("unterminated string", start)),
                Some(b'\\') => {
                    self.idx += 1;
                    if self.peek().is_none() {
                        return Err(self.err("unterminated escape", self.idx));
                    }
                    self.idx += 1;
                }
                Some(b'"') => break,
                Some(_) => self.idx += 1,
            }
        }
        let s = Slice::of(self.buf, start, self.idx - start);
        self.idx += 1; // closing quote
        Ok(s)
    }

    /// A string value, with escapes decoded (allocates, via
    /// [`race_common::Slice::unescape`]).
    pub fn quoted_value(&mut self) -> Result<String, crate::error::ParseError> {
        Ok(self.scan_quoted()?.unescape()?)
    }

    /// A bare scalar (number, boolean, or `null`) as its raw slice.
    pub fn unquoted_value(&mut self) -> Result<Slice<'a>, StructuralParseError> {
        let start = self.idx;
        while matches!(self.peek(), Some(b) if !b.is_ascii_whitespace() && !matches!(b, b',' | b'}' | b']')) {
            self.idx += 1;
        }
        if self.idx == start {
            return Err(self.err("expected a scalar value", start));
        }
        Ok(Slice::of(self.buf, start, self.idx - start))
    }

    /// Skip the value under the cursor without materializing it — used to
    /// discard members/elements the caller isn't interested in.
    pub fn skip_value(&mut self) -> Result<(), StructuralParseError> {
        match self.current_kind()? {
            ValueKind::String => {
                self.scan_quoted()?;
            }
            ValueKind::Object => {
                self.foreach_member_in_current_object(|_, v| v.skip_value())?;
            }
            ValueKind::Array => {
                self.foreach_element_in_current_array(|v| v.skip_value())?;
            }
            ValueKind::Number | ValueKind::Bool | ValueKind::Null => {
                self.unquoted_value()?;
            }
        }
        Ok(())
    }

    /// Iterate the members of the object under the cursor, calling `f` with
    /// the (decoded) member name and a cursor positioned on its value.
    /// Leaves the cursor positioned just past the closing `}`.
    pub fn foreach_member_in_current_object<F>(&mut self, mut f: F) -> Result<(), StructuralParseError>
    where
        F: FnMut(&str, &mut JsonPullParser<'a>) -> Result<(), StructuralParseError>,
    {
        self.expect(b'{')?;
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.idx += 1;
            return Ok(());
        }
        loop {
            self.skip_ws();
            let name = self.scan_quoted()?;
            let name = name
                .unescape()
                .map_err(|e| self.err(format!("invalid member name: {e}"), name.offset()))?;
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            f(&name, &mut *self)?;
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.idx += 1;
                    continue;
                }
                Some(b'}') => {
                    self.idx += 1;
                    break;
                }
                _ => return Err(self.err("expected ',' or '}'", self.idx)),
            }
        }
        Ok(())
    }

    /// Iterate the elements of the array under the cursor, calling `f` with
    /// a cursor positioned on each element in turn. Leaves the cursor
    /// positioned just past the closing `]`.
    pub fn foreach_element_in_current_array<F>(&mut self, mut f: F) -> Result<(), StructuralParseError>
    where
        F: FnMut(&mut JsonPullParser<'a>) -> Result<(), StructuralParseError>,
    {
        self.expect(b'[')?;
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.idx += 1;
            return Ok(());
        }
        loop {
            self.skip_ws();
            f(&mut *self)?;
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.idx += 1;
                    continue;
                }
                Some(b']') => {
                    self.idx += 1;
                    break;
                }
                _ => return Err(self.err("expected ',' or ']'", self.idx)),
            }
        }
        Ok(())
    }
}
