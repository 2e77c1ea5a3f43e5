use std::{collections::BTreeMap, path::Path};

use anyhow::Context;

use crate::{
    foundation::error::{ChoreoError, ChoreoResult},
    pack::page::Page,
};

/// Conventional file name of the split map.
pub const SPLIT_MAP_FILE: &str = "split_map.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Frames held by each page of every split animation, in page order.
pub struct SplitMap(BTreeMap<String, Vec<usize>>);

impl SplitMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, anim: impl Into<String>, page_lengths: Vec<usize>) {
        self.0.insert(anim.into(), page_lengths);
    }

    pub fn record_pages(&mut self, anim: impl Into<String>, pages: &[Page]) {
        self.insert(anim, pages.iter().map(Page::frame_count).collect());
    }

    pub fn page_lengths(&self, anim: &str) -> Option<&[usize]> {
        self.0.get(anim).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(s: &str) -> ChoreoResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: &Path) -> ChoreoResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read split map '{}'", path.display()))?;
        Self::from_json(&s)
    }

    pub fn save(&self, path: &Path) -> ChoreoResult<()> {
        let s = serde_json::to_string_pretty(self)?;
        std::fs::write(path, s)
            .with_context(|| format!("write split map '{}'", path.display()))
            .map_err(ChoreoError::from)
    }
}
