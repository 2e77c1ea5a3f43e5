use crate::{
    foundation::cursor::ByteOrder,
    foundation::error::{ChoreoError, ChoreoResult, PackError},
};

/// Default page size of the playback hardware.
pub const DEFAULT_PAGE_LIMIT: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Packing options.
pub struct PackConfig {
    /// Maximum serialized page length in bytes.
    pub page_limit: usize,
    /// Byte order of page headers (count and local offsets).
    pub byte_order: ByteOrder,
    /// Worker threads for [`crate::split_many`]; `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            byte_order: ByteOrder::Little,
            threads: None,
        }
    }
}

impl PackConfig {
    pub fn validate(&self) -> ChoreoResult<()> {
        if !(8..=u16::MAX as usize).contains(&self.page_limit) {
            return Err(PackError::InvalidLimit {
                limit: self.page_limit,
            }
            .into());
        }
        if self.threads == Some(0) {
            return Err(ChoreoError::config(
                "pack 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}
