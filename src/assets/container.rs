use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    assets::sink::AssetSink,
    foundation::cursor::{ByteCursor, ByteOrder},
    foundation::error::{ChoreoError, ChoreoResult, FormatError},
};

/// Magic tag at the start of every container.
pub const CONTAINER_MAGIC: &[u8; 4] = b"mess";
/// Choreography index written when no blob is designated.
pub const NO_CHOREOGRAPHY: u32 = u32::MAX;

#[derive(Clone, Debug)]
struct Blob {
    name: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
/// Flat multi-blob container writer.
///
/// Layout: `mess`, `u32 count`, `u32 choreography index`, `count × (u32 offset, u32 length)`,
/// then every blob padded to four bytes. Offsets are absolute; lengths exclude padding.
pub struct Container {
    root: PathBuf,
    byte_order: ByteOrder,
    blobs: Vec<Blob>,
    ids_by_name: HashMap<String, u32>,
    sources: HashMap<String, Vec<u8>>,
    choreography: Option<u32>,
}

impl Container {
    /// Empty container resolving file names against `root`.
    pub fn new(root: impl Into<PathBuf>, byte_order: ByteOrder) -> Self {
        Self {
            root: root.into(),
            byte_order,
            blobs: Vec::new(),
            ids_by_name: HashMap::new(),
            sources: HashMap::new(),
            choreography: None,
        }
    }

    /// Provide the bytes for `name` in memory instead of reading them from disk.
    pub fn with_source(mut self, name: &str, bytes: Vec<u8>) -> ChoreoResult<Self> {
        self.sources.insert(normalize_rel_path(name)?, bytes);
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Handle previously assigned to `name`, if any.
    pub fn id_for_name(&self, name: &str) -> Option<u32> {
        normalize_rel_path(name)
            .ok()
            .and_then(|n| self.ids_by_name.get(&n).copied())
    }

    pub fn choreography(&self) -> Option<u32> {
        self.choreography
    }

    /// Append the compiled choreography and designate it.
    pub fn add_choreography(&mut self, bytes: Vec<u8>) -> u32 {
        let idx = self.push(None, bytes);
        self.choreography = Some(idx);
        idx
    }

    fn push(&mut self, name: Option<String>, bytes: Vec<u8>) -> u32 {
        let idx = self.blobs.len() as u32;
        tracing::debug!(
            idx,
            name = name.as_deref().unwrap_or("<anonymous>"),
            len = bytes.len(),
            "blob added"
        );
        self.blobs.push(Blob { name, bytes });
        idx
    }

    fn read_bytes(&self, norm: &str) -> ChoreoResult<Vec<u8>> {
        if let Some(b) = self.sources.get(norm) {
            return Ok(b.clone());
        }
        let path = self.root.join(Path::new(norm));
        if !path.is_file() {
            return Err(ChoreoError::asset(format!(
                "'{norm}' not found under '{}'",
                self.root.display()
            )));
        }
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(ChoreoError::from)
    }

    /// Serialize the whole container.
    pub fn to_bytes(&self) -> Vec<u8> {
        let order = self.byte_order;
        let mut out = Vec::new();
        out.extend_from_slice(CONTAINER_MAGIC);
        order.put_u32(&mut out, self.blobs.len() as u32);
        order.put_u32(&mut out, self.choreography.unwrap_or(NO_CHOREOGRAPHY));

        let mut next = 12 + 8 * self.blobs.len();
        for blob in &self.blobs {
            order.put_u32(&mut out, next as u32);
            order.put_u32(&mut out, blob.bytes.len() as u32);
            next += padded_len(blob.bytes.len());
        }
        for blob in &self.blobs {
            out.extend_from_slice(&blob.bytes);
            out.resize(out.len() + padded_len(blob.bytes.len()) - blob.bytes.len(), 0);
        }
        out
    }

    /// Write the container; returns the size of the header and blob table.
    pub fn write(&self, path: &Path) -> ChoreoResult<usize> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create output directory '{}'", dir.display()))?;
        }
        std::fs::write(path, self.to_bytes())
            .with_context(|| format!("write container '{}'", path.display()))?;
        Ok(12 + 8 * self.blobs.len())
    }

    /// Names of the stored blobs in handle order (`None` for anonymous blobs).
    pub fn names(&self) -> impl Iterator<Item = Option<&str>> {
        self.blobs.iter().map(|b| b.name.as_deref())
    }
}

impl AssetSink for Container {
    fn add_file(&mut self, name: &str) -> ChoreoResult<u32> {
        let norm = normalize_rel_path(name)?;
        if let Some(&id) = self.ids_by_name.get(&norm) {
            return Ok(id);
        }
        let bytes = self.read_bytes(&norm)?;
        let id = self.push(Some(norm.clone()), bytes);
        self.ids_by_name.insert(norm, id);
        Ok(id)
    }

    fn add_bytes(&mut self, name: &str, bytes: Vec<u8>) -> ChoreoResult<u32> {
        let norm = normalize_rel_path(name)?;
        if let Some(&id) = self.ids_by_name.get(&norm) {
            return Ok(id);
        }
        let id = self.push(Some(norm.clone()), bytes);
        self.ids_by_name.insert(norm, id);
        Ok(id)
    }
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(4) * 4
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Parsed container contents.
pub struct ContainerView {
    /// Designated choreography blob.
    pub choreography: Option<u32>,
    /// Blob bytes without padding, in handle order.
    pub blobs: Vec<Vec<u8>>,
}

impl ContainerView {
    pub fn parse(bytes: &[u8], order: ByteOrder) -> ChoreoResult<Self> {
        let mut cursor = ByteCursor::new(bytes);
        if cursor.read_bytes(4)? != CONTAINER_MAGIC {
            return Err(FormatError::BadMagic.into());
        }
        let count = cursor.read_u32(order)? as usize;
        let choreography = match cursor.read_u32(order)? {
            NO_CHOREOGRAPHY => None,
            idx if (idx as usize) < count => Some(idx),
            idx => {
                return Err(FormatError::OffsetOutOfRange {
                    offset: idx as usize,
                    len: count,
                }
                .into());
            }
        };
        let table_len = count.saturating_mul(8);
        if table_len > cursor.remaining() {
            return Err(FormatError::Truncated {
                position: cursor.position(),
                wanted: table_len,
                available: cursor.remaining(),
            }
            .into());
        }
        let mut blobs = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = cursor.read_u32(order)? as usize;
            let len = cursor.read_u32(order)? as usize;
            let blob = ByteCursor::at(bytes, offset)?.read_bytes(len)?;
            blobs.push(blob.to_vec());
        }
        Ok(Self {
            choreography,
            blobs,
        })
    }

    pub fn choreography_bytes(&self) -> Option<&[u8]> {
        self.choreography
            .and_then(|i| self.blobs.get(i as usize))
            .map(Vec::as_slice)
    }
}

/// Normalize and validate a root-relative asset name.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths or `..`.
pub fn normalize_rel_path(source: &str) -> ChoreoResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ChoreoError::asset("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(ChoreoError::asset("asset path must be non-empty"));
    }
    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ChoreoError::asset("asset paths must not contain '..'"));
        }
        out.push(part);
    }
    if out.is_empty() {
        return Err(ChoreoError::asset("asset path must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/container.rs"]
mod tests;
