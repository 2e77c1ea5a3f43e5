use std::collections::BTreeMap;

use crate::codec::command::CommandGroup;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Deduplicated, 0-based command arena for one source animation.
///
/// `groups` holds one decoded group per distinct frame offset; `frames` keeps the original
/// frame sequence (with repeats); `data` is the flat buffer every group is written into at its
/// own offset, so tween deltas are plain byte arithmetic over it.
pub struct Arena {
    pub(crate) groups: BTreeMap<u32, CommandGroup>,
    pub(crate) frames: Vec<u32>,
    pub(crate) data: Vec<u8>,
}

impl Arena {
    pub fn groups(&self) -> &BTreeMap<u32, CommandGroup> {
        &self.groups
    }

    pub fn group(&self, offset: u32) -> Option<&CommandGroup> {
        self.groups.get(&offset)
    }

    /// Frame sequence as arena offsets, repeats preserved.
    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Locate the group whose byte span contains `target`.
    ///
    /// Returns the group's offset and the offset of `target` within it.
    pub fn resolve(&self, target: i64) -> Option<(u32, usize)> {
        let t = u32::try_from(target).ok()?;
        let (&start, group) = self.groups.range(..=t).next_back()?;
        let within = (t - start) as usize;
        (within < group.encoded_len()).then_some((start, within))
    }
}
