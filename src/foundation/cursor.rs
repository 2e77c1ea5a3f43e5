use crate::foundation::error::{ChoreoResult, FormatError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Byte order used for multi-byte integers in emitted files.
pub enum ByteOrder {
    /// Little-endian (default for pages and choreography).
    #[default]
    Little,
    /// Big-endian, as in the source disk image.
    Big,
}

impl ByteOrder {
    /// Append `v` to `out`.
    pub fn put_u16(self, out: &mut Vec<u8>, v: u16) {
        match self {
            Self::Little => out.extend_from_slice(&v.to_le_bytes()),
            Self::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    /// Append `v` to `out`.
    pub fn put_u32(self, out: &mut Vec<u8>, v: u32) {
        match self {
            Self::Little => out.extend_from_slice(&v.to_le_bytes()),
            Self::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    /// Append `v` to `out`.
    pub fn put_i16(self, out: &mut Vec<u8>, v: i16) {
        self.put_u16(out, v as u16);
    }
}

#[derive(Clone, Debug)]
/// Sequential reader over a borrowed byte buffer.
///
/// Every read is bounds-checked and fails with [`FormatError::Truncated`] rather than panicking.
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Cursor positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Cursor positioned at `pos`, which must be within `buf` (end inclusive).
    pub fn at(buf: &'a [u8], pos: usize) -> ChoreoResult<Self> {
        let mut c = Self::new(buf);
        c.seek(pos)?;
        Ok(c)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Move to an absolute position.
    pub fn seek(&mut self, pos: usize) -> ChoreoResult<()> {
        if pos > self.buf.len() {
            return Err(FormatError::OffsetOutOfRange {
                offset: pos,
                len: self.buf.len(),
            }
            .into());
        }
        self.pos = pos;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> ChoreoResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(FormatError::Truncated {
                position: self.pos,
                wanted: n,
                available: self.remaining(),
            }
            .into());
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> ChoreoResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> ChoreoResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self, order: ByteOrder) -> ChoreoResult<u16> {
        let b = self.read_array::<2>()?;
        Ok(match order {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        })
    }

    pub fn read_u32(&mut self, order: ByteOrder) -> ChoreoResult<u32> {
        let b = self.read_array::<4>()?;
        Ok(match order {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        })
    }

    pub fn read_u16_be(&mut self) -> ChoreoResult<u16> {
        self.read_u16(ByteOrder::Big)
    }

    pub fn read_u32_be(&mut self) -> ChoreoResult<u32> {
        self.read_u32(ByteOrder::Big)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/cursor.rs"]
mod tests;
