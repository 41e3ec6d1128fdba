//! Variable-length integers.
//!
//! Ids and sizes on the wire are framed UTF-8 style: the number of
//! leading zero bits before the first set bit of the first byte selects
//! the total width (1 to 8 bytes), the set bit itself is the width
//! marker, and the remaining `7n` bits carry the payload. `0x81` is the
//! one-byte encoding of 1; `0x4001` is a two-byte encoding of the same
//! value.
//!
//! A [`Varint`] keeps the *raw* bit pattern rather than the decoded
//! payload, so a stream that used a wider-than-necessary encoding
//! writes back byte-identically.

use std::fmt;
use std::io::{Read, Write};

use byteorder::ReadBytesExt;

use crate::ebml::types::error::{map_eof, EbmlError, Result};

/// Largest integer any encoding can carry: 8 bytes leave 56 payload bits.
pub const MAX_ENCODABLE: u64 = (1 << 56) - 1;

/// A variable-length unsigned integer in its raw wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Varint {
    raw: u64,
}

impl Varint {
    /// Reads one varint from `src`, consuming exactly as many bytes as
    /// its first byte announces.
    ///
    /// # Errors
    /// [`EbmlError::InvalidVarint`] when the first byte is zero (no
    /// width marker within 8 bytes); [`EbmlError::UnexpectedEof`] when
    /// the source ends before the announced width is complete.
    pub fn read<R: Read>(src: &mut R) -> Result<Varint> {
        let first = src.read_u8().map_err(|e| map_eof(e, "varint"))?;
        if first == 0 {
            return Err(EbmlError::InvalidVarint(0));
        }

        let width = first.leading_zeros() as usize + 1;
        let mut raw = u64::from(first);
        for _ in 1..width {
            let next = src.read_u8().map_err(|e| map_eof(e, "varint"))?;
            raw = (raw << 8) | u64::from(next);
        }

        Ok(Varint { raw })
    }

    /// Reads one varint from the front of a byte slice. The slice must
    /// hold the complete encoding; extra trailing bytes are ignored.
    pub fn parse(mut bytes: &[u8]) -> Result<Varint> {
        Varint::read(&mut bytes)
    }

    /// Encodes `value` at the minimum width that can carry it.
    ///
    /// # Errors
    /// [`EbmlError::IntegerTooBig`] when `value` exceeds
    /// [`MAX_ENCODABLE`].
    pub fn encode(value: u64) -> Result<Varint> {
        if value > MAX_ENCODABLE {
            return Err(EbmlError::IntegerTooBig(value));
        }
        Ok(Varint {
            raw: value | marker(min_width(value)),
        })
    }

    /// The raw bit pattern, width marker included.
    pub fn raw(self) -> u64 {
        self.raw
    }

    /// The decoded integer: the raw form with the width marker cleared.
    pub fn value(self) -> u64 {
        self.raw & (marker(self.width()) - 1)
    }

    /// The number of bytes this varint occupies on the wire.
    pub fn size(self) -> usize {
        self.width() as usize
    }

    /// Writes the raw form as `size()` big-endian bytes.
    pub fn write<W: Write>(self, dst: &mut W) -> Result<()> {
        let bytes = self.raw.to_be_bytes();
        dst.write_all(&bytes[8 - self.size()..])?;
        Ok(())
    }

    /// Re-encodes to the minimum width carrying the same value.
    pub fn normalize(self) -> Varint {
        let value = self.value();
        Varint {
            raw: value | marker(min_width(value)),
        }
    }

    // The marker bit is always the highest set bit of a well-formed raw
    // pattern, and sits at bit position 7*width.
    fn width(self) -> u32 {
        (63 - self.raw.leading_zeros()) / 7
    }
}

impl fmt::LowerHex for Varint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.raw, f)
    }
}

fn marker(width: u32) -> u64 {
    1 << (7 * width)
}

fn min_width(value: u64) -> u32 {
    let bits = 64 - value.leading_zeros();
    if bits == 0 {
        return 1;
    }
    bits / 7 + u32::from(bits % 7 != 0)
}
