use thiserror::Error;

/// Faults raised by the `DataBuf` cursor and the message codec built on top
/// of it. Distinct from `race_parse`'s structural/content split — the wire
/// layer deals in fixed-width fields, not free-form text, so a single
/// bounds/shape error taxonomy is enough.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("write of {needed} bytes at pos {pos} would exceed capacity {capacity}")]
    CapacityExceeded {
        pos: usize,
        needed: usize,
        capacity: usize,
    },

    #[error("read of {needed} bytes at pos {pos} would exceed filled length {filled}")]
    OutOfBounds {
        pos: usize,
        needed: usize,
        filled: usize,
    },

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("bad frame magic: expected 0x{expected:08X}, found 0x{found:08X}")]
    BadMagic { expected: u32, found: u32 },

    #[error("unknown message type {0}")]
    UnknownMessageType(u16),

    #[error("unknown payload type {0} in DATA message")]
    UnknownPayloadType(u16),

    #[error("frame too short: needed at least {needed} bytes, got {got}")]
    FrameTooShort { needed: usize, got: usize },
}
