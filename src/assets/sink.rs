use crate::foundation::error::ChoreoResult;

/// Where compiled events store the files they reference.
///
/// Handles are stable: adding the same source name twice returns the first handle.
pub trait AssetSink {
    /// Store the file `name` (relative to the sink's root) and return its handle.
    fn add_file(&mut self, name: &str) -> ChoreoResult<u32>;

    /// Store `bytes` under the identity `name` and return its handle.
    fn add_bytes(&mut self, name: &str, bytes: Vec<u8>) -> ChoreoResult<u32>;
}
