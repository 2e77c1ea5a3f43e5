use crate::{
    choreography::encode::CommandTag,
    foundation::cursor::{ByteCursor, ByteOrder},
    foundation::error::{ChoreoError, ChoreoResult, FormatError},
};

/// `ms` of the end-of-stream entry.
pub const SENTINEL_MS: u32 = 0xFFFF_FFFF;
/// Bytes reserved for each scene name.
pub const SCENE_NAME_LEN: usize = 8;

const SENTINEL_NAME: &str = "end";
const HEADER_LEN: usize = 16;
const ENTRY_LEN: usize = 8 + SCENE_NAME_LEN;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneEntry {
    /// Timeline position of the scene.
    pub ms: u32,
    /// Byte offset of the scene's record from the start of the stream.
    pub offset: u32,
    /// Name, at most eight bytes.
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Random-access table of scene boundaries, terminated by a sentinel entry.
pub struct SceneIndex {
    entries: Vec<SceneEntry>,
}

impl SceneIndex {
    /// Build from scene positions relative to the first event record.
    ///
    /// Offsets are shifted by the index record's own length; `events_len` is the size of
    /// every event record and locates the sentinel.
    pub fn build(scenes: Vec<SceneEntry>, events_len: u32) -> Self {
        let shift = Self::record_len_for(scenes.len() + 1);
        let mut entries: Vec<SceneEntry> = scenes
            .into_iter()
            .map(|s| SceneEntry {
                offset: s.offset + shift,
                name: truncate_name(&s.name),
                ..s
            })
            .collect();
        entries.push(SceneEntry {
            ms: SENTINEL_MS,
            offset: events_len + shift,
            name: SENTINEL_NAME.to_string(),
        });
        Self { entries }
    }

    fn record_len_for(entries: usize) -> u32 {
        (HEADER_LEN + ENTRY_LEN * entries) as u32
    }

    /// Length of the serialized index record, header included.
    pub fn record_len(&self) -> u32 {
        Self::record_len_for(self.entries.len())
    }

    /// Every entry, sentinel last.
    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    /// Real scenes only.
    pub fn scenes(&self) -> &[SceneEntry] {
        &self.entries[..self.entries.len().saturating_sub(1)]
    }

    /// Append the index record: `[0][len][SCENE_INDEX][count][count × (ms, offset, name[8])]`.
    pub fn write(&self, order: ByteOrder, out: &mut Vec<u8>) {
        order.put_u32(out, 0);
        order.put_u32(out, self.record_len());
        order.put_u32(out, CommandTag::SceneIndex as u32);
        order.put_u32(out, self.entries.len() as u32);
        for e in &self.entries {
            order.put_u32(out, e.ms);
            order.put_u32(out, e.offset);
            let mut name = [0u8; SCENE_NAME_LEN];
            let raw = e.name.as_bytes();
            let n = raw.len().min(SCENE_NAME_LEN);
            name[..n].copy_from_slice(&raw[..n]);
            out.extend_from_slice(&name);
        }
    }

    /// Parse the index record at the start of a compiled stream.
    pub fn parse(stream: &[u8], order: ByteOrder) -> ChoreoResult<Self> {
        let mut c = ByteCursor::new(stream);
        let _start = c.read_u32(order)?;
        let len = c.read_u32(order)?;
        let tag = c.read_u32(order)?;
        if tag != CommandTag::SceneIndex as u32 {
            return Err(ChoreoError::config(format!(
                "stream starts with command {tag}, not a scene index"
            )));
        }
        let count = c.read_u32(order)? as usize;
        let expected = count
            .checked_mul(ENTRY_LEN)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .and_then(|n| u32::try_from(n).ok());
        if expected != Some(len) {
            return Err(ChoreoError::config(format!(
                "scene index record is {len} bytes but lists {count} entries"
            )));
        }
        if count * ENTRY_LEN > c.remaining() {
            return Err(FormatError::Truncated {
                position: c.position(),
                wanted: count * ENTRY_LEN,
                available: c.remaining(),
            }
            .into());
        }
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let ms = c.read_u32(order)?;
            let offset = c.read_u32(order)?;
            let raw = c.read_bytes(SCENE_NAME_LEN)?;
            let end = raw.iter().position(|&b| b == 0).unwrap_or(SCENE_NAME_LEN);
            entries.push(SceneEntry {
                ms,
                offset,
                name: String::from_utf8_lossy(&raw[..end]).into_owned(),
            });
        }
        Ok(Self { entries })
    }

    /// Byte range of the scene playing at `ms`: the scene's offset and the next boundary.
    ///
    /// Times before the first scene resolve to the first scene. Returns `None` when there are
    /// no scenes or `ms` is the sentinel value itself.
    pub fn seek(&self, ms: u32) -> Option<(u32, u32)> {
        let scenes = self.scenes();
        if scenes.is_empty() {
            return None;
        }
        let after = self.entries.iter().position(|e| e.ms > ms)?;
        let at = after.saturating_sub(1);
        (at < scenes.len()).then(|| (self.entries[at].offset, self.entries[at + 1].offset))
    }
}

fn truncate_name(name: &str) -> String {
    let mut end = name.len().min(SCENE_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/choreography/scene_index.rs"]
mod tests;
