//! Bounds-checked little-endian cursor over account bytes
//!
//! Every fixed-width unpack in the decoder goes through [`ByteReader`], so a
//! short buffer always surfaces as [`Error::TruncatedRecord`] instead of a
//! panic inside `bytes::Buf`.

use crate::error::{Error, Result};
use bytes::Buf;

/// Forward-only reader over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn require(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(Error::TruncatedRecord {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// Skip `len` bytes without interpreting them
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.require(len)?;
        self.buf.advance(len);
        Ok(())
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.require(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Everything not yet consumed
    pub fn rest(self) -> &'a [u8] {
        self.buf
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    /// Single-byte boolean, any non-zero value is `true`
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.require(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.require(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.require(8)?;
        Ok(self.buf.get_i64_le())
    }

    /// Copy out a fixed-size byte array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.require(N)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() -> Result<()> {
        let bytes = [
            0x01, 0x02, // u16
            0x03, 0x00, 0x00, 0x00, // u32
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // i64 = -1
            0xaa, 0xbb,
        ];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.read_u16()?, 0x0201);
        assert_eq!(reader.read_u32()?, 3);
        assert_eq!(reader.read_i64()?, -1);
        assert_eq!(reader.read_array::<2>()?, [0xaa, 0xbb]);
        assert_eq!(reader.remaining(), 0);
        Ok(())
    }

    #[test]
    fn test_short_buffer_is_truncated_record() {
        let bytes = [0u8; 6];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(
            reader.read_u64(),
            Err(Error::TruncatedRecord {
                needed: 8,
                remaining: 6
            })
        );
        // A failed read consumes nothing
        assert_eq!(reader.remaining(), 6);
    }

    #[test]
    fn test_take_and_skip() -> Result<()> {
        let bytes = [1u8, 2, 3, 4, 5];
        let mut reader = ByteReader::new(&bytes);

        reader.skip(1)?;
        assert_eq!(reader.take(2)?, &[2, 3]);
        assert_eq!(reader.rest(), &[4, 5]);
        Ok(())
    }
}
