//! Stream configuration.
//!
//! Both peers of a stream must use the same configuration: the rekey interval
//! decides when forced rotations happen, and a mismatch desynchronizes the
//! receiver at the first forced rekey.

use crate::rekey::MAX_REKEY_INTERVAL;

/// Largest plaintext accepted in a single chunk by default (16 MiB).
pub const DEFAULT_MAX_CHUNK_LEN: usize = 16 * 1024 * 1024;

/// Stream configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Chunks per epoch before a rekey is forced. Clamped to
    /// `1..=MAX_REKEY_INTERVAL` when the stream is created.
    pub rekey_interval: u32,
    /// Largest plaintext accepted in a single chunk. Zero allows only empty
    /// chunks and is refused by [`StreamWriter`](crate::StreamWriter).
    pub max_chunk_len: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { rekey_interval: MAX_REKEY_INTERVAL, max_chunk_len: DEFAULT_MAX_CHUNK_LEN }
    }
}

impl StreamConfig {
    /// Force a rekey every `interval` chunks.
    #[must_use]
    pub fn with_rekey_interval(mut self, interval: u32) -> Self {
        self.rekey_interval = interval;
        self
    }

    /// Cap the plaintext size of a single chunk.
    #[must_use]
    pub fn with_max_chunk_len(mut self, max_chunk_len: usize) -> Self {
        self.max_chunk_len = max_chunk_len;
        self
    }
}
