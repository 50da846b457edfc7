//! Rekey scheduling and subkey rotation.
//!
//! A rotation replaces the subkey with a one-way derivation of itself and
//! reopens the counter space. The base nonce stays fixed for the life of the
//! stream; nonces repeat across epochs but never under the same subkey.

use sealstream_crypto::{BaseNonce, SubKey, derive_next_subkey};

use crate::nonce::COUNTER_MAX;

/// Distance from `COUNTER_MAX` at which a rekey is always forced.
pub const REKEY_SAFETY_MARGIN: u32 = 16;

/// Largest configurable number of chunks per epoch.
pub const MAX_REKEY_INTERVAL: u32 = COUNTER_MAX - REKEY_SAFETY_MARGIN;

/// Decides when an epoch must end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RekeyScheduler {
    /// Counter value at which rotation is forced
    ceiling: u32,
}

impl RekeyScheduler {
    /// Scheduler forcing a rekey every `interval` chunks, clamped to
    /// `1..=MAX_REKEY_INTERVAL`.
    pub fn new(interval: u32) -> Self {
        Self { ceiling: interval.clamp(1, MAX_REKEY_INTERVAL) }
    }

    /// Counter value at which rotation is forced.
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// True when the epoch must end before another chunk is processed.
    pub fn should_force_rekey(&self, counter: u32) -> bool {
        counter >= self.ceiling
    }

    /// Replace `subkey` with the next epoch's subkey.
    ///
    /// The old subkey is zeroized as it is dropped.
    pub fn rotate(&self, subkey: &mut SubKey, base_nonce: &BaseNonce) {
        *subkey = derive_next_subkey(subkey, base_nonce);
    }
}

impl Default for RekeyScheduler {
    fn default() -> Self {
        Self::new(MAX_REKEY_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use sealstream_crypto::{NONCE_BYTES, SessionKey, derive_stream_keys, open_chunk, seal_chunk};

    use super::*;

    #[test]
    fn default_ceiling_leaves_safety_margin() {
        let scheduler = RekeyScheduler::default();

        assert_eq!(scheduler.ceiling(), COUNTER_MAX - REKEY_SAFETY_MARGIN);
        assert!(!scheduler.should_force_rekey(0));
        assert!(!scheduler.should_force_rekey(MAX_REKEY_INTERVAL - 1));
        assert!(scheduler.should_force_rekey(MAX_REKEY_INTERVAL));
        assert!(scheduler.should_force_rekey(COUNTER_MAX));
    }

    #[test]
    fn interval_is_clamped() {
        assert_eq!(RekeyScheduler::new(0).ceiling(), 1);
        assert_eq!(RekeyScheduler::new(u32::MAX).ceiling(), MAX_REKEY_INTERVAL);
        assert_eq!(RekeyScheduler::new(100).ceiling(), 100);
    }

    #[test]
    fn small_interval_forces_early() {
        let scheduler = RekeyScheduler::new(4);

        assert!(!scheduler.should_force_rekey(3));
        assert!(scheduler.should_force_rekey(4));
    }

    #[test]
    fn rotate_changes_subkey() {
        let keys = derive_stream_keys(&SessionKey::from_array([0u8; 32]), &[1u8; 24]);
        let mut subkey = keys.subkey;
        let nonce = [0u8; NONCE_BYTES];

        let before = seal_chunk(&subkey, &nonce, 0, b"sample", b"");
        RekeyScheduler::default().rotate(&mut subkey, &keys.base_nonce);

        assert!(open_chunk(&subkey, &nonce, &before, b"").is_err());
    }
}
