//! Fixed-capacity byte buffer with an explicit read/write cursor. Every
//! operation takes and returns a `pos` rather than hiding it as mutable
//! buffer-internal state, so a single `DataBuf` can be shared by callers
//! that checkpoint and rewind their own cursor (e.g. the server composing
//! one outbound frame per client into the same backing array).

use crate::error::ProtocolError;

/// Owned byte array with a fixed capacity fixed at construction. `pos`
/// tracks how much of the buffer carries meaningful bytes on the read
/// side; callers writing into it are responsible for passing back the
/// right `pos` themselves (it is not implicit mutable state on `self`).
#[derive(Debug, Clone)]
pub struct DataBuf {
    bytes: Vec<u8>,
    capacity: usize,
}

impl DataBuf {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity],
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self, len: usize) -> &[u8] {
        &self.bytes[..len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn check_write(&self, pos: usize, needed: usize) -> Result<(), ProtocolError> {
        let fits = pos.checked_add(needed).map(|end| end <= self.capacity).unwrap_or(false);
        if !fits {
            return Err(ProtocolError::CapacityExceeded {
                pos,
                needed,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn check_read(&self, pos: usize, needed: usize, filled: usize) -> Result<(), ProtocolError> {
        let fits = pos.checked_add(needed).map(|end| end <= filled).unwrap_or(false);
        if !fits {
            return Err(ProtocolError::OutOfBounds { pos, needed, filled });
        }
        Ok(())
    }

    pub fn write_byte(&mut self, pos: usize, v: u8) -> Result<usize, ProtocolError> {
        self.check_write(pos, 1)?;
        self.bytes[pos] = v;
        Ok(pos + 1)
    }

    pub fn read_byte(&self, pos: usize, filled: usize) -> Result<(u8, usize), ProtocolError> {
        self.check_read(pos, 1, filled)?;
        Ok((self.bytes[pos], pos + 1))
    }

    pub fn write_short(&mut self, pos: usize, v: u16) -> Result<usize, ProtocolError> {
        self.check_write(pos, 2)?;
        self.bytes[pos..pos + 2].copy_from_slice(&v.to_be_bytes());
        Ok(pos + 2)
    }

    pub fn read_short(&self, pos: usize, filled: usize) -> Result<(u16, usize), ProtocolError> {
        self.check_read(pos, 2, filled)?;
        let v = u16::from_be_bytes(self.bytes[pos..pos + 2].try_into().unwrap());
        Ok((v, pos + 2))
    }

    pub fn write_int(&mut self, pos: usize, v: i32) -> Result<usize, ProtocolError> {
        self.check_write(pos, 4)?;
        self.bytes[pos..pos + 4].copy_from_slice(&v.to_be_bytes());
        Ok(pos + 4)
    }

    pub fn read_int(&self, pos: usize, filled: usize) -> Result<(i32, usize), ProtocolError> {
        self.check_read(pos, 4, filled)?;
        let v = i32::from_be_bytes(self.bytes[pos..pos + 4].try_into().unwrap());
        Ok((v, pos + 4))
    }

    pub fn write_uint(&mut self, pos: usize, v: u32) -> Result<usize, ProtocolError> {
        self.write_int(pos, v as i32)
    }

    pub fn read_uint(&self, pos: usize, filled: usize) -> Result<(u32, usize), ProtocolError> {
        let (v, pos) = self.read_int(pos, filled)?;
        Ok((v as u32, pos))
    }

    pub fn write_long(&mut self, pos: usize, v: i64) -> Result<usize, ProtocolError> {
        self.check_write(pos, 8)?;
        self.bytes[pos..pos + 8].copy_from_slice(&v.to_be_bytes());
        Ok(pos + 8)
    }

    pub fn read_long(&self, pos: usize, filled: usize) -> Result<(i64, usize), ProtocolError> {
        self.check_read(pos, 8, filled)?;
        let v = i64::from_be_bytes(self.bytes[pos..pos + 8].try_into().unwrap());
        Ok((v, pos + 8))
    }

    pub fn write_double(&mut self, pos: usize, v: f64) -> Result<usize, ProtocolError> {
        self.check_write(pos, 8)?;
        self.bytes[pos..pos + 8].copy_from_slice(&v.to_bits().to_be_bytes());
        Ok(pos + 8)
    }

    pub fn read_double(&self, pos: usize, filled: usize) -> Result<(f64, usize), ProtocolError> {
        self.check_read(pos, 8, filled)?;
        let bits = u64::from_be_bytes(self.bytes[pos..pos + 8].try_into().unwrap());
        Ok((f64::from_bits(bits), pos + 8))
    }

    /// `u16` length prefix, then UTF-8 bytes.
    pub fn write_string(&mut self, pos: usize, s: &str) -> Result<usize, ProtocolError> {
        let body = s.as_bytes();
        let len: u16 = body
            .len()
            .try_into()
            .map_err(|_| ProtocolError::CapacityExceeded {
                pos,
                needed: body.len(),
                capacity: u16::MAX as usize,
            })?;
        let pos = self.write_short(pos, len)?;
        self.check_write(pos, body.len())?;
        self.bytes[pos..pos + body.len()].copy_from_slice(body);
        Ok(pos + body.len())
    }

    pub fn read_string(&self, pos: usize, filled: usize) -> Result<(String, usize), ProtocolError> {
        let (len, pos) = self.read_short(pos, filled)?;
        let len = len as usize;
        self.check_read(pos, len, filled)?;
        let s = std::str::from_utf8(&self.bytes[pos..pos + len])
            .map_err(|_| ProtocolError::InvalidUtf8)?
            .to_string();
        Ok((s, pos + len))
    }

    /// Read a length-prefixed string into `out`, truncating to `out.len() -
    /// 1` bytes and always NUL-terminating (mirrors a C-style `strncpy`
    /// target buffer). Returns the number of bytes copied, excluding the
    /// terminator.
    pub fn read_strncpy(&self, pos: usize, filled: usize, out: &mut [u8]) -> Result<(usize, usize), ProtocolError> {
        let (len, new_pos) = self.read_short(pos, filled)?;
        let len = len as usize;
        self.check_read(new_pos, len, filled)?;
        let src = &self.bytes[new_pos..new_pos + len];
        let cap = out.len().saturating_sub(1);
        let copy_len = src.len().min(cap);
        out[..copy_len].copy_from_slice(&src[..copy_len]);
        if !out.is_empty() {
            out[copy_len] = 0;
        }
        Ok((copy_len, new_pos + len))
    }

    pub fn write_bytes(&mut self, pos: usize, bytes: &[u8]) -> Result<usize, ProtocolError> {
        self.check_write(pos, bytes.len())?;
        self.bytes[pos..pos + bytes.len()].copy_from_slice(bytes);
        Ok(pos + bytes.len())
    }

    pub fn read_bytes(&self, pos: usize, len: usize, filled: usize) -> Result<(&[u8], usize), ProtocolError> {
        self.check_read(pos, len, filled)?;
        Ok((&self.bytes[pos..pos + len], pos + len))
    }
}
