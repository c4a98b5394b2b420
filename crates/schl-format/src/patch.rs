//! Patch decoder: one variable-length field of the header tag stream.
//!
//! Wire layout after the tag byte:
//!
//! ```text
//! [1 byte]  n
//! n == 0xFF : [4 bytes BE] len, [len bytes] opaque payload   -> value 0
//! n >  4    : [n bytes] opaque payload                       -> value 0
//! n <= 4    : [n bytes] big-endian unsigned value (n == 0 -> 0)
//! ```
//!
//! Patch values are always big-endian, whatever the stream's own byte order.

use crate::error::Result;
use crate::source::{ByteSource, Endian};

/// Length byte announcing a 32-bit payload length.
const LONG_PATCH: u8 = 0xFF;

/// Widest numeric patch value in bytes.
const MAX_NUMERIC_LEN: u8 = 4;

/// A decoded patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    /// Numeric value; 0 for opaque payloads.
    pub value: u32,
    /// Bytes consumed, including the length byte.
    pub consumed: u64,
}

/// Decode the patch whose length byte sits at `cursor`.
pub fn decode_patch<S: ByteSource + ?Sized>(source: &S, cursor: u64) -> Result<Patch> {
    let len = source.read_u8(cursor)?;

    if len == LONG_PATCH {
        let payload = source.read_u32(cursor + 1, Endian::Big)?;
        return Ok(Patch {
            value: 0,
            consumed: 1 + 4 + u64::from(payload),
        });
    }

    if len > MAX_NUMERIC_LEN {
        return Ok(Patch {
            value: 0,
            consumed: 1 + u64::from(len),
        });
    }

    let mut value = 0u32;
    for i in 0..u64::from(len) {
        value = (value << 8) | u32::from(source.read_u8(cursor + 1 + i)?);
    }

    Ok(Patch {
        value,
        consumed: 1 + u64::from(len),
    })
}
