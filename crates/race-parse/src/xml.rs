//! Allocation-free pull parser for a practical XML subset: elements,
//! attributes, text content, CDATA sections, comments, and the `<?...?>`
//! prolog. No DTD/entity resolution beyond the five predefined XML entities.

use race_common::{RangeStack, Slice};

use crate::error::StructuralParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Positioned right after a tag name, before its attributes have been
    /// consumed.
    InOpenTag,
    /// Between tags / at top level; the next `<` starts a new event.
    BetweenTags,
    Finished,
}

/// Streaming, allocation-free XML tokenizer. The caller repeatedly calls
/// [`XmlPullParser::parse_next_element`] / [`parse_next_attribute`] /
/// [`parse_trimmed_text`]; each call updates public-facing accessor state
/// and returns whether there was progress.
pub struct XmlPullParser<'a> {
    buf: &'a [u8],
    idx: usize,
    mode: Mode,
    path: RangeStack,
    tag: Option<Slice<'a>>,
    is_start: bool,
    is_empty_element: bool,
    last_was_start_element: bool,
    attr_name: Option<Slice<'a>>,
    attr_value: Option<Slice<'a>>,
}

impl<'a> XmlPullParser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            idx: 0,
            mode: Mode::BetweenTags,
            path: RangeStack::new(),
            tag: None,
            is_start: false,
            is_empty_element: false,
            last_was_start_element: false,
            attr_name: None,
            attr_value: None,
        }
    }

    /// Reinitialize against a new buffer, reusing the path-stack allocation.
    pub fn reset(&mut self, buf: &'a [u8]) {
        self.buf = buf;
        self.idx = 0;
        self.mode = Mode::BetweenTags;
        self.path.clear();
        self.tag = None;
        self.is_start = false;
        self.is_empty_element = false;
        self.last_was_start_element = false;
        self.attr_name = None;
        self.attr_value = None;
    }

    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    pub fn current_tag(&self) -> Option<Slice<'a>> {
        self.tag
    }

    pub fn is_start_element(&self) -> bool {
        self.is_start
    }

    pub fn is_empty_element(&self) -> bool {
        self.is_empty_element
    }

    pub fn last_was_start_element(&self) -> bool {
        self.last_was_start_element
    }

    pub fn attribute_name(&self) -> Option<Slice<'a>> {
        self.attr_name
    }

    pub fn attribute_value(&self) -> Option<Slice<'a>> {
        self.attr_value
    }

    fn name_of(&self, r: race_common::Range) -> String {
        Slice::of(self.buf, r.offset as usize, r.len as usize).to_owned_string()
    }

    pub fn has_parent(&self, name: &str) -> bool {
        self.path
            .ancestor(0)
            .map(|r| self.name_of(r) == name)
            .unwrap_or(false)
    }

    /// `segments` given nearest-ancestor-first, as in spec.md 4.B.
    pub fn has_parents(&self, segments: &[&str]) -> bool {
        self.path.has_parents(segments, |r| self.name_of(r))
    }

    pub fn has_some_parent(&self, name: &str) -> bool {
        self.path.has_some_parent(name, |r| self.name_of(r))
    }

    fn err(&self, msg: impl Into<String>, pos: usize) -> StructuralParseError {
        StructuralParseError::new(msg, pos, self.buf)
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.idx).copied()
    }

    fn starts_with(&self, pat: &[u8]) -> bool {
        self.buf[self.idx..].starts_with(pat)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.idx += 1;
        }
    }

    /// Skip `<?...?>` prolog and `<!-- ... -->` comments that precede the
    /// next real tag. Returns once positioned at a real `<tag`/`</tag`, or
    /// at end of input.
    fn skip_noise(&mut self) -> Result<(), StructuralParseError> {
        loop {
            // advance to the next '<', discarding interleaving text
            while self.peek().is_some() && self.peek() != Some(b'<') {
                self.idx += 1;
            }
            if self.peek().is_none() {
                return Ok(());
            }
            if self.starts_with(b"<?") {
                let close = find(self.buf, self.idx, b"?>")
                    .ok_or_else(|| self.err("unterminated processing instruction", self.idx))?;
                self.idx = close + 2;
                continue;
            }
            if self.starts_with(b"<!--") {
                let close = find(self.buf, self.idx, b"-->")
                    .ok_or_else(|| self.err("unterminated comment", self.idx))?;
                self.idx = close + 3;
                continue;
            }
            if self.starts_with(b"<!DOCTYPE") || self.starts_with(b"<!doctype") {
                let close = find(self.buf, self.idx, b">")
                    .ok_or_else(|| self.err("unterminated doctype", self.idx))?;
                self.idx = close + 1;
                continue;
            }
            return Ok(());
        }
    }

    fn is_name_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':')
    }

    fn scan_name(&mut self) -> Result<(usize, usize), StructuralParseError> {
        let start = self.idx;
        while matches!(self.peek(), Some(b) if Self::is_name_byte(b)) {
            self.idx += 1;
        }
        if self.idx == start {
            return Err(self.err("expected element or attribute name", start));
        }
        Ok((start, self.idx - start))
    }

    /// Drive the open tag to completion, discarding any attributes the
    /// caller didn't pull explicitly.
    fn finish_open_tag_if_needed(&mut self) -> Result<(), StructuralParseError> {
        while self.mode == Mode::InOpenTag {
            self.parse_next_attribute()?;
        }
        Ok(())
    }

    /// Pull the next tag event (start or end). Returns `Ok(false)` at end of
    /// input. If the caller did not fully drain attributes of a previous
    /// start tag via [`parse_next_attribute`], they are discarded here.
    pub fn parse_next_element(&mut self) -> Result<bool, StructuralParseError> {
        self.finish_open_tag_if_needed()?;
        self.last_was_start_element = self.is_start && !self.is_empty_element;
        self.attr_name = None;
        self.attr_value = None;

        self.skip_noise()?;
        if self.peek().is_none() {
            self.mode = Mode::Finished;
            self.tag = None;
            return Ok(false);
        }

        // consume '<'
        self.idx += 1;
        if self.peek() == Some(b'/') {
            self.idx += 1;
            let (start, len) = self.scan_name()?;
            self.skip_ws();
            if self.peek() != Some(b'>') {
                return Err(self.err("malformed end tag", self.idx));
            }
            self.idx += 1;
            let name = Slice::of(self.buf, start, len);
            match self.path.pop() {
                Some(top) if self.name_of(top) == name.to_owned_string() => {}
                Some(top) => {
                    return Err(self.err(
                        format!(
                            "unbalanced end tag </{}>, expected </{}>",
                            name,
                            self.name_of(top)
                        ),
                        start,
                    ))
                }
                None => return Err(self.err(format!("unmatched end tag </{name}>"), start)),
            }
            self.tag = Some(name);
            self.is_start = false;
            self.is_empty_element = false;
            self.mode = Mode::BetweenTags;
            return Ok(true);
        }

        let (start, len) = self.scan_name()?;
        self.tag = Some(Slice::of(self.buf, start, len));
        self.is_start = true;
        // Resolved via lookahead so callers see the correct value
        // immediately, without being forced to drain attributes first.
        self.is_empty_element = self.peek_self_closing()?;
        self.mode = Mode::InOpenTag;
        Ok(true)
    }

    /// Scan forward from the current position (right after a tag name)
    /// through its attribute list, without consuming input or allocating,
    /// purely to determine whether the tag closes with `/>`.
    fn peek_self_closing(&self) -> Result<bool, StructuralParseError> {
        let mut idx = self.idx;
        loop {
            while matches!(self.buf.get(idx), Some(b) if b.is_ascii_whitespace()) {
                idx += 1;
            }
            match self.buf.get(idx) {
                Some(b'/') => return Ok(self.buf.get(idx + 1) == Some(&b'>')),
                Some(b'>') => return Ok(false),
                None => return Err(self.err("unexpected end of input inside tag", idx)),
                _ => {
                    while matches!(self.buf.get(idx), Some(&b) if Self::is_name_byte(b)) {
                        idx += 1;
                    }
                    while matches!(self.buf.get(idx), Some(b) if b.is_ascii_whitespace()) {
                        idx += 1;
                    }
                    if self.buf.get(idx) != Some(&b'=') {
                        return Err(self.err("expected '=' after attribute name", idx));
                    }
                    idx += 1;
                    while matches!(self.buf.get(idx), Some(b) if b.is_ascii_whitespace()) {
                        idx += 1;
                    }
                    let quote = *self
                        .buf
                        .get(idx)
                        .ok_or_else(|| self.err("expected quoted attribute value", idx))?;
                    if quote != b'"' && quote != b'\'' {
                        return Err(self.err("expected quoted attribute value", idx));
                    }
                    idx += 1;
                    while self.buf.get(idx).is_some() && self.buf.get(idx) != Some(&quote) {
                        idx += 1;
                    }
                    if self.buf.get(idx) != Some(&quote) {
                        return Err(self.err("unterminated attribute value", idx));
                    }
                    idx += 1;
                }
            }
        }
    }

    /// Pull the next attribute of the currently open start tag. Returns
    /// `Ok(false)` once the tag's `>` (or self-closing `/>`) is reached,
    /// finalizing the path-stack push (and, for self-closing tags,
    /// immediate pop — spec.md 4.B).
    pub fn parse_next_attribute(&mut self) -> Result<bool, StructuralParseError> {
        if self.mode != Mode::InOpenTag {
            return Ok(false);
        }
        self.skip_ws();
        match self.peek() {
            Some(b'/') => {
                self.idx += 1;
                if self.peek() != Some(b'>') {
                    return Err(self.err("malformed self-closing tag", self.idx));
                }
                self.idx += 1;
                let tag = self.tag.expect("InOpenTag implies tag is set");
                self.path.push(tag.offset() as u32, tag.len() as u32);
                self.path.pop();
                self.is_empty_element = true;
                self.mode = Mode::BetweenTags;
                self.attr_name = None;
                self.attr_value = None;
                Ok(false)
            }
            Some(b'>') => {
                self.idx += 1;
                let tag = self.tag.expect("InOpenTag implies tag is set");
                self.path.push(tag.offset() as u32, tag.len() as u32);
                self.mode = Mode::BetweenTags;
                self.attr_name = None;
                self.attr_value = None;
                Ok(false)
            }
            None => Err(self.err("unexpected end of input inside tag", self.idx)),
            _ => {
                let (nstart, nlen) = self.scan_name()?;
                self.skip_ws();
                if self.peek() != Some(b'=') {
                    return Err(self.err("expected '=' after attribute name", self.idx));
                }
                self.idx += 1;
                self.skip_ws();
                let quote = self
                    .peek()
                    .filter(|&b| b == b'"' || b == b'\'')
                    .ok_or_else(|| self.err("expected quoted attribute value", self.idx))?;
                self.idx += 1;
                let vstart = self.idx;
                while self.peek().is_some() && self.peek() != Some(quote) {
                    self.idx += 1;
                }
                if self.peek() != Some(quote) {
                    return Err(self.err("unterminated attribute value", vstart));
                }
                let vlen = self.idx - vstart;
                self.idx += 1; // closing quote
                self.attr_name = Some(Slice::of(self.buf, nstart, nlen));
                self.attr_value = Some(Slice::of(self.buf, vstart, vlen));
                Ok(true)
            }
        }
    }

    /// Read text up to the next real tag, trimming ASCII whitespace from
    /// both ends. Embedded CDATA sections and comments do not terminate the
    /// scan (a literal `<` inside either does not start a tag), but their
    /// delimiters are returned verbatim as part of the slice — this method
    /// does not unwrap or splice content, since a [`Slice`] is always one
    /// contiguous byte range.
    pub fn parse_trimmed_text(&mut self) -> Result<Slice<'a>, StructuralParseError> {
        self.finish_open_tag_if_needed()?;
        let start = self.idx;
        loop {
            if self.starts_with(b"<![CDATA[") {
                let close = find(self.buf, self.idx + 9, b"]]>")
                    .ok_or_else(|| self.err("unterminated CDATA section", self.idx))?;
                self.idx = close + 3;
                continue;
            }
            if self.starts_with(b"<!--") {
                let close = find(self.buf, self.idx, b"-->")
                    .ok_or_else(|| self.err("unterminated comment", self.idx))?;
                self.idx = close + 3;
                continue;
            }
            if self.peek().is_none() || self.peek() == Some(b'<') {
                break;
            }
            self.idx += 1;
        }
        let end = self.idx;
        let (tstart, tlen) = trim_ascii(self.buf, start, end);
        Ok(Slice::of(self.buf, tstart, tlen))
    }

    /// Discard text up to the next `<` without materializing a slice.
    pub fn skip_to_text(&mut self) -> Result<(), StructuralParseError> {
        self.parse_trimmed_text().map(|_| ())
    }

    /// Walk whitespace/comma separated doubles within the current text
    /// content (used for coordinate streams). Returns `None` once the next
    /// `<` is reached.
    pub fn parse_next_double(&mut self) -> Result<Option<f64>, crate::error::ParseError> {
        match self.parse_next_numeric_token()? {
            Some(slice) => Ok(Some(slice.to_double()?)),
            None => Ok(None),
        }
    }

    pub fn parse_next_int(&mut self) -> Result<Option<i64>, crate::error::ParseError> {
        match self.parse_next_numeric_token()? {
            Some(slice) => Ok(Some(slice.to_long()?)),
            None => Ok(None),
        }
    }

    fn parse_next_numeric_token(&mut self) -> Result<Option<Slice<'a>>, StructuralParseError> {
        self.finish_open_tag_if_needed()?;
        loop {
            match self.peek() {
                None => return Ok(None),
                Some(b'<') => return Ok(None),
                Some(b) if b.is_ascii_whitespace() || b == b',' => {
                    self.idx += 1;
                }
                _ => break,
            }
        }
        let start = self.idx;
        while let Some(b) = self.peek() {
            if b == b'<' || b == b',' || b.is_ascii_whitespace() {
                break;
            }
            self.idx += 1;
        }
        Ok(Some(Slice::of(self.buf, start, self.idx - start)))
    }
}

fn find(buf: &[u8], from: usize, pat: &[u8]) -> Option<usize> {
    if from > buf.len() {
        return None;
    }
    buf[from..]
        .windows(pat.len())
        .position(|w| w == pat)
        .map(|p| p + from)
}

fn trim_ascii(buf: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && buf[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && buf[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    (start, end - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_scenario_from_spec() {
        let input = br#"<a x="1"><b>hello</b></a>"#;
        let mut p = XmlPullParser::new(input);

        assert!(p.parse_next_element().unwrap());
        assert_eq!(p.current_tag().unwrap().to_owned_string(), "a");
        assert!(p.is_start_element());

        assert!(p.parse_next_attribute().unwrap());
        assert_eq!(p.attribute_name().unwrap().to_owned_string(), "x");
        assert_eq!(p.attribute_value().unwrap().to_owned_string(), "1");

        assert!(p.parse_next_element().unwrap());
        assert_eq!(p.current_tag().unwrap().to_owned_string(), "b");
        assert!(p.is_start_element());

        let text = p.parse_trimmed_text().unwrap();
        assert_eq!(text.to_owned_string(), "hello");

        assert!(p.parse_next_element().unwrap());
        assert_eq!(p.current_tag().unwrap().to_owned_string(), "b");
        assert!(!p.is_start_element());

        assert!(p.parse_next_element().unwrap());
        assert_eq!(p.current_tag().unwrap().to_owned_string(), "a");
        assert!(!p.is_start_element());

        assert!(!p.parse_next_element().unwrap());
    }

    #[test]
    fn depth_returns_to_zero_and_visits_every_start_and_matching_end() {
        let input = br#"<root><child1/><child2><grandchild>x</grandchild></child2></root>"#;
        let mut p = XmlPullParser::new(input);
        let mut starts = 0;
        let mut ends = 0;
        let mut effective_start_open = false;
        while p.parse_next_element().unwrap() {
            assert_eq!(p.last_was_start_element(), effective_start_open);
            effective_start_open = p.is_start_element() && !p.is_empty_element();
            if p.is_start_element() {
                starts += 1;
                if p.is_empty_element() {
                    ends += 1;
                }
            } else {
                ends += 1;
            }
        }
        assert_eq!(starts, ends);
        assert_eq!(p.depth(), 0);
    }

    #[test]
    fn empty_element_pushes_and_pops_so_has_parent_is_consistent() {
        let input = br#"<root><leaf a="1"/></root>"#;
        let mut p = XmlPullParser::new(input);
        assert!(p.parse_next_element().unwrap()); // root
        assert!(p.parse_next_element().unwrap()); // leaf (empty)
        while p.parse_next_attribute().unwrap() {}
        assert!(p.is_empty_element());
        assert!(p.has_parent("root"));
        assert!(p.parse_next_element().unwrap()); // root end
        assert!(!p.is_start_element());
        assert_eq!(p.depth(), 0);
    }

    #[test]
    fn cdata_does_not_terminate_text_scan() {
        let input = br#"<a>before<![CDATA[raw <<text>>]]>after</a>"#;
        let mut p = XmlPullParser::new(input);
        assert!(p.parse_next_element().unwrap());
        let text = p.parse_trimmed_text().unwrap();
        assert_eq!(text.to_owned_string(), "before<![CDATA[raw <<text>>]]>after");
        assert!(p.parse_next_element().unwrap());
        assert!(!p.is_start_element());
    }

    #[test]
    fn comment_before_a_tag_is_skipped() {
        let input = br#"<a><!-- c --><b/></a>"#;
        let mut p = XmlPullParser::new(input);
        assert!(p.parse_next_element().unwrap()); // a
        assert!(p.parse_next_element().unwrap()); // b, self-closing
        assert_eq!(p.current_tag().unwrap().to_owned_string(), "b");
        assert!(p.is_empty_element());
    }

    #[test]
    fn unbalanced_end_tag_is_structural_error() {
        let input = br#"<a><b></a></b>"#;
        let mut p = XmlPullParser::new(input);
        p.parse_next_element().unwrap();
        p.parse_next_element().unwrap();
        assert!(p.parse_next_element().is_err());
    }

    #[test]
    fn numeric_coordinate_list_inside_content() {
        let input = br#"<pts>1.0, 2.5 3,4</pts>"#;
        let mut p = XmlPullParser::new(input);
        p.parse_next_element().unwrap();
        let mut vals = Vec::new();
        while let Some(v) = p.parse_next_double().unwrap() {
            vals.push(v);
        }
        assert_eq!(vals, vec![1.0, 2.5, 3.0, 4.0]);
    }
}
