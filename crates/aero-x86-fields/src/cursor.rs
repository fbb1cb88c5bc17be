use crate::error::{DecodeError, Field, Result};

/// Forward-only read position over an immutable instruction buffer.
///
/// The cursor never rewinds and never mutates the underlying bytes, so the
/// buffer can be inspected after a decode (successful or not) to see exactly
/// which bytes were consumed.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Bytes read so far.
    pub fn consumed(&self) -> &'a [u8] {
        &self.bytes[..self.pos]
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Consume the byte returned by the preceding [`peek`](Self::peek).
    ///
    /// Does nothing at the end of the buffer.
    pub fn bump(&mut self) {
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    pub fn read_u8(&mut self, field: Field) -> Result<u8> {
        let [b] = self.read_array::<1>(field)?;
        Ok(b)
    }

    /// Read exactly `N` bytes, failing without advancing if fewer remain.
    pub fn read_array<const N: usize>(&mut self, field: Field) -> Result<[u8; N]> {
        let end = self.pos + N;
        let Some(src) = self.bytes.get(self.pos..end) else {
            return Err(DecodeError::Truncated {
                field,
                offset: self.pos,
            });
        };
        let mut out = [0u8; N];
        out.copy_from_slice(src);
        self.pos = end;
        Ok(out)
    }
}
