use std::{collections::BTreeMap, path::Path};

use anyhow::Context;

use crate::{
    arena::builder::assemble,
    arena::model::Arena,
    codec::group::decode_group_at,
    foundation::cursor::ByteCursor,
    foundation::error::{ChoreoError, ChoreoResult, FormatError},
};

/// File-name suffix of a packed animation.
pub const PACKED_SUFFIX: &str = "_anim.bin";

impl Arena {
    /// Serialize as a packed animation: big-endian `u16` frame count, the frame offsets as
    /// big-endian `u16`, then the flat arena.
    pub fn to_packed(&self) -> ChoreoResult<Vec<u8>> {
        if self.data.len() > u16::MAX as usize {
            return Err(FormatError::ArenaTooLarge {
                len: self.data.len(),
            }
            .into());
        }
        let count = u16::try_from(self.frames.len()).map_err(|_| {
            ChoreoError::config(format!("{} frames exceed a u16 count", self.frames.len()))
        })?;
        let mut out = Vec::with_capacity(2 + 2 * self.frames.len() + self.data.len());
        out.extend_from_slice(&count.to_be_bytes());
        for &f in &self.frames {
            // bounded by data.len() above
            out.extend_from_slice(&(f as u16).to_be_bytes());
        }
        out.extend_from_slice(&self.data);
        Ok(out)
    }

    /// Parse a packed animation back into an arena.
    pub fn from_packed(bytes: &[u8]) -> ChoreoResult<Self> {
        let mut cursor = ByteCursor::new(bytes);
        let count = cursor.read_u16_be()? as usize;
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            frames.push(u32::from(cursor.read_u16_be()?));
        }
        if frames.is_empty() {
            return Err(FormatError::EmptyFrameTable.into());
        }
        let data = &bytes[cursor.position()..];
        let mut groups = BTreeMap::new();
        for &f in &frames {
            if groups.contains_key(&f) {
                continue;
            }
            if f as usize >= data.len() {
                return Err(FormatError::OffsetOutOfRange {
                    offset: f as usize,
                    len: data.len(),
                }
                .into());
            }
            groups.insert(f, decode_group_at(data, f as usize)?);
        }
        let arena = assemble(groups, frames);
        if arena.data.as_slice() != data {
            tracing::debug!(
                stored = data.len(),
                rebuilt = arena.data.len(),
                "packed data carries bytes outside decoded groups"
            );
        }
        Ok(arena)
    }

    pub fn write_packed(&self, path: &Path) -> ChoreoResult<()> {
        let bytes = self.to_packed()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("write packed animation '{}'", path.display()))
            .map_err(ChoreoError::from)
    }

    pub fn read_packed(path: &Path) -> ChoreoResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read packed animation '{}'", path.display()))?;
        Self::from_packed(&bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/arena/packed.rs"]
mod tests;
