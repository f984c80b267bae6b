//! Growable byte buffer that fills itself a chunk at a time from a
//! `std::io::Read`, handing the CSV parser whole-record windows without
//! the caller having to manage read buffering itself.

use std::io::{self, Read};

const INITIAL_CAPACITY: usize = 8 * 1024;

/// Buffers bytes from an underlying reader, growing geometrically, and
/// exposes the filled region as a single contiguous slice. Line/record
/// boundaries are located by the caller ([`crate::csv::CsvPullParser`])
/// since the buffer itself carries no record-format knowledge.
pub struct LineBuffer<R> {
    reader: R,
    buf: Vec<u8>,
    filled: usize,
    eof: bool,
}

impl<R: Read> LineBuffer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0u8; INITIAL_CAPACITY],
            filled: 0,
            eof: false,
        }
    }

    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Discard `n` bytes from the front of the filled region, shifting the
    /// remainder down. Called once a caller has consumed a complete record.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.filled, "consume({n}) exceeds filled length {}", self.filled);
        self.buf.copy_within(n..self.filled, 0);
        self.filled -= n;
    }

    /// Read more bytes from the underlying reader, growing the buffer if it
    /// is already full. Returns the number of bytes appended (`0` at EOF).
    pub fn fill_more(&mut self) -> io::Result<usize> {
        if self.filled == self.buf.len() {
            let new_cap = self.buf.len() * 2;
            self.buf.resize(new_cap, 0);
        }
        let n = self.reader.read(&mut self.buf[self.filled..])?;
        if n == 0 {
            self.eof = true;
        }
        self.filled += n;
        Ok(n)
    }

    /// Keep reading until `predicate` reports the filled region is ready to
    /// parse (e.g. contains a full record's worth of bytes), or EOF.
    pub fn fill_until(&mut self, mut predicate: impl FnMut(&[u8]) -> bool) -> io::Result<()> {
        while !predicate(self.filled()) && !self.eof {
            self.fill_more()?;
        }
        Ok(())
    }
}
