//! Pull parser for delimiter-separated records over a borrowed byte buffer.
//! Aviation CSV inputs are unquoted, so every field is returned as a direct
//! slice of the input with no escape handling.

use race_common::Slice;

use crate::error::StructuralParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    AtRecordStart,
    InRecord,
    Finished,
}

/// Streaming CSV/TSV field reader. `delimiter` is configurable so the same
/// state machine serves comma, tab, or pipe-separated input.
pub struct CsvPullParser<'a> {
    buf: &'a [u8],
    idx: usize,
    delimiter: u8,
    mode: Mode,
    field: Option<Slice<'a>>,
}

impl<'a> CsvPullParser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_delimiter(buf, b',')
    }

    pub fn with_delimiter(buf: &'a [u8], delimiter: u8) -> Self {
        Self { buf, idx: 0, delimiter, mode: Mode::AtRecordStart, field: None }
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.idx).copied()
    }

    fn at_record_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'\n') | Some(b'\r'))
    }

    fn skip_newline(&mut self) {
        if self.peek() == Some(b'\r') {
            self.idx += 1;
        }
        if self.peek() == Some(b'\n') {
            self.idx += 1;
        }
    }

    pub fn current_field(&self) -> Option<Slice<'a>> {
        self.field
    }

    /// Advance past the current record without reading its remaining
    /// fields.
    pub fn skip_to_next_record(&mut self) {
        while !self.at_record_end() {
            self.idx += 1;
        }
        self.skip_newline();
        self.mode = Mode::AtRecordStart;
        self.field = None;
    }

    /// True if there is another record to read.
    pub fn has_next_record(&self) -> bool {
        self.peek().is_some()
    }

    /// Pull the next field of the current record. Returns `Ok(false)` when
    /// the record (or input) ends; call [`Self::skip_to_next_record`] or
    /// simply call this again to move to the next record's first field.
    pub fn read_next_value(&mut self) -> Result<bool, StructuralParseError> {
        if self.mode == Mode::Finished {
            return Ok(false);
        }
        if self.at_record_end() {
            self.skip_newline();
            self.field = None;
            if self.peek().is_none() {
                self.mode = Mode::Finished;
            } else {
                self.mode = Mode::AtRecordStart;
            }
            return Ok(false);
        }
        self.mode = Mode::InRecord;

        let start = self.idx;
        while !self.at_record_end() && self.peek() != Some(self.delimiter) {
            self.idx += 1;
        }
        self.field = Some(Slice::of(self.buf, start, self.idx - start));

        if self.peek() == Some(self.delimiter) {
            self.idx += 1;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_record(buf: &[u8]) -> Vec<String> {
        let mut p = CsvPullParser::new(buf);
        let mut out = Vec::new();
        while p.read_next_value().unwrap() {
            out.push(p.current_field().unwrap().to_owned_string());
        }
        out
    }

    #[test]
    fn unquoted_fields_round_trip() {
        assert_eq!(read_record(b"a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_fields_are_preserved() {
        assert_eq!(read_record(b"a,,c"), vec!["a", "", "c"]);
    }

    #[test]
    fn multiple_records_advance_independently() {
        let input = b"a,b\nc,d\n";
        let mut p = CsvPullParser::new(input);
        let mut records = Vec::new();
        loop {
            let mut record = Vec::new();
            let mut any = false;
            while p.read_next_value().unwrap() {
                any = true;
                record.push(p.current_field().unwrap().to_owned_string());
            }
            if !any && !p.has_next_record() {
                break;
            }
            records.push(record);
            if !p.has_next_record() {
                break;
            }
        }
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn skip_to_next_record_discards_remaining_fields() {
        let input = b"a,b,c\nd,e,f";
        let mut p = CsvPullParser::new(input);
        assert!(p.read_next_value().unwrap());
        assert_eq!(p.current_field().unwrap().to_owned_string(), "a");
        p.skip_to_next_record();
        assert!(p.read_next_value().unwrap());
        assert_eq!(p.current_field().unwrap().to_owned_string(), "d");
    }

    #[test]
    fn tab_delimiter_splits_fields() {
        assert_eq!(read_record_with(b"a\tb\tc", b'\t'), vec!["a", "b", "c"]);
    }

    fn read_record_with(buf: &[u8], delim: u8) -> Vec<String> {
        let mut p = CsvPullParser::with_delimiter(buf, delim);
        let mut out = Vec::new();
        while p.read_next_value().unwrap() {
            out.push(p.current_field().unwrap().to_owned_string());
        }
        out
    }
}
