//! Forward-only reader over an in-memory byte buffer.
//!
//! All multi-byte values in the `.lines` format are little-endian and fixed-width, so
//! the cursor only ever needs to hand out exact-length slices. A short read is always
//! an error; the cursor never zero-fills.

use crate::error::{Error, Result};

/// Sequential little-endian reader
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current byte offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns up to `len` upcoming bytes without consuming them
    pub fn peek(&self, len: usize) -> &'a [u8] {
        let end = self.position + len.min(self.remaining());
        &self.data[self.position..end]
    }

    /// Consumes exactly `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(Error::truncated(self.position, len, remaining));
        }

        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    fn read_array(&mut self) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Reads an unsigned 32-bit little-endian integer
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads an IEEE-754 single precision little-endian float
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_read_u32_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u32().unwrap(), 0x0403_0201);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_read_f32_little_endian() {
        let data = 2.125f32.to_le_bytes();
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_f32().unwrap(), 2.125);
    }

    #[test]
    fn test_short_read_is_truncated() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut cursor = ByteCursor::new(&data);
        let err = cursor.read_u32().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
        assert!(matches!(
            err,
            Error::TruncatedInput {
                offset: 0,
                needed: 4,
                remaining: 3
            }
        ));
        // Failed reads do not advance
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_sequential_reads() {
        let mut data = Vec::new();
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&0.5f32.to_le_bytes());
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u32().unwrap(), 7);
        assert_eq!(cursor.read_f32().unwrap(), 0.5);
        assert!(cursor.read_f32().is_err());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let cursor = ByteCursor::new(b"abc");
        assert_eq!(cursor.peek(2), b"ab");
        assert_eq!(cursor.peek(10), b"abc");
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_bytes() {
        let mut cursor = ByteCursor::new(b"header+rest");
        assert_eq!(cursor.read_bytes(6).unwrap(), b"header");
        assert_eq!(cursor.remaining(), 5);
        assert!(cursor.read_bytes(6).is_err());
    }
}
