use std::collections::BTreeMap;

use crate::{
    arena::model::Arena,
    codec::command::CommandGroup,
    codec::group::{decode_group_at, encode_group_into},
    foundation::cursor::ByteCursor,
    foundation::error::{ChoreoError, ChoreoResult, FormatError},
};

/// Read a source frame table at `table_pos`: a big-endian `u16` count followed by
/// `count + 1` big-endian `u32` offsets relative to the table. Returns absolute offsets.
pub fn read_frame_table(image: &[u8], table_pos: usize) -> ChoreoResult<Vec<u32>> {
    let mut cursor = ByteCursor::at(image, table_pos)?;
    let count = cursor.read_u16_be()? as usize;
    let mut out = Vec::with_capacity(count + 1);
    for _ in 0..=count {
        let raw = cursor.read_u32_be()?;
        let abs = u32::try_from(table_pos)
            .ok()
            .and_then(|p| p.checked_add(raw))
            .ok_or(FormatError::OffsetOutOfRange {
                offset: table_pos + raw as usize,
                len: image.len(),
            })?;
        out.push(abs);
    }
    Ok(out)
}

/// Build an arena from absolute frame offsets into `source`, failing on the first bad group.
pub fn build_arena(source: &[u8], frame_table: &[u32]) -> ChoreoResult<Arena> {
    match build_arena_partial(source, frame_table)? {
        (arena, None) => Ok(arena),
        (_, Some(err)) => Err(err),
    }
}

/// Build an arena, truncating the frame sequence at the first group that fails to decode.
///
/// The failure is returned next to the truncated arena. An empty table, or a failure on the
/// very first frame, is still an error since there is nothing to keep.
#[tracing::instrument(skip(source, frame_table), fields(frames = frame_table.len()))]
pub fn build_arena_partial(
    source: &[u8],
    frame_table: &[u32],
) -> ChoreoResult<(Arena, Option<ChoreoError>)> {
    let base = *frame_table
        .iter()
        .min()
        .ok_or(FormatError::EmptyFrameTable)?;

    let mut groups = BTreeMap::new();
    let mut frames = Vec::with_capacity(frame_table.len());
    let mut failure = None;

    for (idx, &abs) in frame_table.iter().enumerate() {
        let rel = abs - base;
        if !groups.contains_key(&rel) {
            match decode_group_at(source, abs as usize) {
                Ok(g) => {
                    groups.insert(rel, g);
                }
                Err(err) => {
                    tracing::warn!(frame = idx, offset = abs, %err, "arena truncated");
                    failure = Some(err);
                    break;
                }
            }
        }
        frames.push(rel);
    }

    if frames.is_empty() {
        return Err(failure.unwrap_or_else(|| FormatError::EmptyFrameTable.into()));
    }

    let arena = assemble(groups, frames);
    tracing::debug!(
        groups = arena.groups.len(),
        bytes = arena.data.len(),
        "arena built"
    );
    Ok((arena, failure))
}

/// Lay decoded groups into a zero-filled flat buffer at their offsets.
pub(crate) fn assemble(groups: BTreeMap<u32, CommandGroup>, frames: Vec<u32>) -> Arena {
    let len = groups
        .iter()
        .map(|(&off, g)| off as usize + g.encoded_len())
        .max()
        .unwrap_or(0);
    let mut data = vec![0u8; len];
    let mut scratch = Vec::new();
    for (&off, g) in &groups {
        scratch.clear();
        encode_group_into(g, &mut scratch);
        let at = off as usize;
        data[at..at + scratch.len()].copy_from_slice(&scratch);
    }
    Arena {
        groups,
        frames,
        data,
    }
}

impl Arena {
    /// Read the frame table at `table_pos` in a disk image and build the arena it describes.
    pub fn extract(image: &[u8], table_pos: usize) -> ChoreoResult<Self> {
        build_arena(image, &read_frame_table(image, table_pos)?)
    }

    /// Like [`Arena::extract`], but keeps the frames decoded before a failure.
    pub fn extract_partial(
        image: &[u8],
        table_pos: usize,
    ) -> ChoreoResult<(Self, Option<ChoreoError>)> {
        build_arena_partial(image, &read_frame_table(image, table_pos)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/arena/builder.rs"]
mod tests;
