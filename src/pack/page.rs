use std::collections::{BTreeMap, BTreeSet};

use crate::{
    arena::builder::assemble,
    arena::model::Arena,
    codec::command::CommandGroup,
    codec::group::{decode_group_at, encode_group_into},
    foundation::cursor::{ByteCursor, ByteOrder},
    foundation::error::{ChoreoResult, FormatError, PackError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Outcome of offering one frame to a page under construction.
pub enum Offer {
    /// The frame fits and was appended.
    Accepted,
    /// The frame does not fit. The page dropped this many trailing entries, which must be
    /// offered again (before the rejected frame) to the next page.
    Rewind(usize),
}

#[derive(Debug)]
/// A page being accumulated from an arena's frame sequence.
pub struct PageBuilder<'a> {
    arena: &'a Arena,
    limit: usize,
    index: usize,
    first_frame: usize,
    entries: Vec<u32>,
    members: BTreeMap<u32, usize>,
    group_bytes: usize,
}

impl<'a> PageBuilder<'a> {
    /// Start page `index`, whose first entry is frame `first_frame` of the sequence.
    pub fn new(arena: &'a Arena, limit: usize, index: usize, first_frame: usize) -> Self {
        Self {
            arena,
            limit,
            index,
            first_frame,
            entries: Vec::new(),
            members: BTreeMap::new(),
            group_bytes: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serialized length of the page as it stands.
    pub fn current_len(&self) -> usize {
        2 + 2 * self.entries.len() + self.group_bytes
    }

    fn group_len(&self, offset: u32) -> ChoreoResult<usize> {
        self.arena
            .group(offset)
            .map(CommandGroup::encoded_len)
            .ok_or_else(|| {
                FormatError::OffsetOutOfRange {
                    offset: offset as usize,
                    len: self.arena.data().len(),
                }
                .into()
            })
    }

    fn has_tween(&self, offset: u32) -> bool {
        self.arena.group(offset).is_some_and(CommandGroup::has_tween)
    }

    /// Offer the next frame offset.
    pub fn offer(&mut self, offset: u32) -> ChoreoResult<Offer> {
        let added = if self.members.contains_key(&offset) {
            0
        } else {
            self.group_len(offset)?
        };
        let prospective = self.current_len() + 2 + added;
        if prospective <= self.limit {
            self.entries.push(offset);
            *self.members.entry(offset).or_insert(0) += 1;
            self.group_bytes += added;
            return Ok(Offer::Accepted);
        }

        if self.entries.is_empty() {
            return Err(PackError::GroupTooLarge {
                offset,
                needed: prospective,
                limit: self.limit,
            }
            .into());
        }

        let mut dropped = 0usize;
        while let Some(&last) = self.entries.last() {
            if !self.has_tween(last) {
                break;
            }
            self.pop()?;
            dropped += 1;
        }
        if self.entries.is_empty() {
            return Err(PackError::NoRewindTarget {
                page: self.index,
                frame: self.first_frame + dropped,
            }
            .into());
        }
        tracing::debug!(page = self.index, dropped, "page rewound");
        Ok(Offer::Rewind(dropped))
    }

    fn pop(&mut self) -> ChoreoResult<()> {
        let Some(last) = self.entries.pop() else {
            return Ok(());
        };
        let remove = match self.members.get_mut(&last) {
            Some(n) if *n > 1 => {
                *n -= 1;
                false
            }
            _ => true,
        };
        if remove {
            self.members.remove(&last);
            self.group_bytes -= self.group_len(last)?;
        }
        Ok(())
    }

    /// Re-base the retained groups and serialize the page.
    pub fn finish(self, order: ByteOrder) -> ChoreoResult<Page> {
        let mut local = BTreeMap::new();
        let mut next = 0usize;
        for &orig in self.members.keys() {
            local.insert(orig, next);
            next += self.group_len(orig)?;
        }

        let mut bytes = Vec::with_capacity(self.current_len());
        order.put_u16(&mut bytes, self.entries.len() as u16);
        for orig in &self.entries {
            order.put_u16(&mut bytes, local[orig] as u16);
        }

        for (&orig, &new_base) in &local {
            let Some(group) = self.arena.group(orig) else {
                continue;
            };
            let relocated = group.map_tweens(|site, tween| {
                let payload_orig = i64::from(orig) + site as i64;
                let payload_new = (new_base + site) as i64;
                let (from, to) = tween.targets(payload_orig);
                let from = self.relocate(&local, payload_orig as u32, from)?;
                let to = self.relocate(&local, payload_orig as u32, to)?;
                tween.retargeted(payload_new, from, to).ok_or_else(|| {
                    PackError::RelocationOverflow {
                        page: self.index,
                        offset: payload_orig as u32,
                    }
                    .into()
                })
            })?;
            encode_group_into(&relocated, &mut bytes);
        }

        let frames = self
            .entries
            .iter()
            .map(|orig| local[orig] as u16)
            .collect();
        Ok(Page {
            index: self.index,
            first_frame: self.first_frame,
            frames,
            source_groups: self.members.keys().copied().collect(),
            bytes,
        })
    }

    fn relocate(
        &self,
        local: &BTreeMap<u32, usize>,
        tween_at: u32,
        target: i64,
    ) -> ChoreoResult<i64> {
        let (group, within) = self.arena.resolve(target).ok_or(PackError::UnresolvedTween {
            offset: tween_at,
            target,
        })?;
        let base = local.get(&group).ok_or(PackError::TweenOutOfPage {
            page: self.index,
            offset: tween_at,
            target,
        })?;
        Ok((base + within) as i64)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One finalized, self-contained page.
pub struct Page {
    /// Page number within its animation.
    pub index: usize,
    /// Position of the page's first entry in the source frame sequence.
    pub first_frame: usize,
    /// Local offset of every frame entry.
    pub frames: Vec<u16>,
    /// Arena offsets of the groups the page carries, ascending.
    pub source_groups: BTreeSet<u32>,
    /// Serialized page.
    pub bytes: Vec<u8>,
}

impl Page {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Re-parse a serialized page and check the size bound and tween locality.
///
/// Every tween must resolve, using page-local addressing, into a group stored in the page.
pub fn validate_page(
    bytes: &[u8],
    order: ByteOrder,
    limit: usize,
    page: usize,
) -> ChoreoResult<()> {
    if bytes.len() > limit {
        return Err(PackError::PageOverflow {
            page,
            len: bytes.len(),
            limit,
        }
        .into());
    }
    let local = parse_page(bytes, order)?;
    for (&at, group) in local.groups() {
        for (site, tween) in group.tween_sites() {
            let payload = i64::from(at) + site as i64;
            let (from, to) = tween.targets(payload);
            for target in [from, to] {
                if local.resolve(target).is_none() {
                    return Err(PackError::TweenOutOfPage {
                        page,
                        offset: payload as u32,
                        target,
                    }
                    .into());
                }
            }
        }
    }
    Ok(())
}

/// Decode a page into an arena addressed by local offsets.
pub fn parse_page(bytes: &[u8], order: ByteOrder) -> ChoreoResult<Arena> {
    let mut cursor = ByteCursor::new(bytes);
    let count = cursor.read_u16(order)? as usize;
    let mut frames = Vec::with_capacity(count);
    for _ in 0..count {
        frames.push(u32::from(cursor.read_u16(order)?));
    }
    let data = &bytes[cursor.position()..];
    let mut groups = BTreeMap::new();
    for &f in &frames {
        if !groups.contains_key(&f) {
            groups.insert(f, decode_group_at(data, f as usize)?);
        }
    }
    Ok(assemble(groups, frames))
}

#[cfg(test)]
#[path = "../../tests/unit/pack/page.rs"]
mod tests;
