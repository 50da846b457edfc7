//! Per-chunk nonce sequencing.
//!
//! Nonce layout (24 bytes, `XChaCha20`):
//!
//! ```text
//! bytes 0-19:  base nonce (fixed for the stream)
//! bytes 20-23: base nonce XOR counter (big-endian u32)
//! ```
//!
//! For a fixed base nonce the mapping is injective in the counter, so a
//! (subkey, nonce) pair repeats only if the counter repeats within an epoch.
//! The rekey scheduler rotates the subkey before the counter can wrap.

use sealstream_crypto::NONCE_BYTES;

/// Largest counter value representable in the nonce's counter field.
pub const COUNTER_MAX: u32 = u32::MAX;

/// Offset of the counter field inside the nonce
const COUNTER_OFFSET: usize = NONCE_BYTES - size_of::<u32>();

/// Nonce for the chunk at `counter` within the current epoch.
pub fn next_nonce(base_nonce: &[u8; NONCE_BYTES], counter: u32) -> [u8; NONCE_BYTES] {
    let mut nonce = *base_nonce;
    for (byte, counter_byte) in nonce[COUNTER_OFFSET..].iter_mut().zip(counter.to_be_bytes()) {
        *byte ^= counter_byte;
    }
    nonce
}
