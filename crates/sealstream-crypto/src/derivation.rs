//! Stream key schedule: HKDF for the initial keys, HMAC for rotation
//!
//! # Security Properties
//!
//! - Header binding: different headers under one session key produce
//!   unrelated subkeys and base nonces
//! - One-way rotation: a rotated subkey does not reveal its predecessor
//! - Determinism: same inputs always produce the same keys

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::keys::{BaseNonce, KEY_BYTES, NONCE_BYTES, SessionKey, StreamKeys, SubKey};

type HmacSha256 = Hmac<Sha256>;

/// Label used for initial stream key derivation
const STREAM_KEYS_LABEL: &[u8] = b"sealstreamKeysV1";

/// Label for deriving the next epoch's subkey
const REKEY_LABEL: &[u8] = b"sealstreamRekeyV1";

/// Derive the first subkey and the base nonce of a stream.
///
/// HKDF-SHA256 with the public header as salt and the session key as input
/// keying material, expanded to `subkey || base_nonce` (56 bytes).
pub fn derive_stream_keys(session_key: &SessionKey, header: &[u8]) -> StreamKeys {
    let hkdf = Hkdf::<Sha256>::new(Some(header), session_key.expose_secret());

    let mut okm = [0u8; KEY_BYTES + NONCE_BYTES];
    let Ok(()) = hkdf.expand(STREAM_KEYS_LABEL, &mut okm) else {
        unreachable!("56 bytes is a valid HKDF-SHA256 output length");
    };

    let mut subkey = [0u8; KEY_BYTES];
    let mut base_nonce = [0u8; NONCE_BYTES];
    subkey.copy_from_slice(&okm[..KEY_BYTES]);
    base_nonce.copy_from_slice(&okm[KEY_BYTES..]);

    let keys = StreamKeys { subkey: SubKey::new(subkey), base_nonce: BaseNonce::new(base_nonce) };

    okm.zeroize();
    subkey.zeroize();
    base_nonce.zeroize();

    keys
}

/// Derive the next epoch's subkey from the current one.
///
/// HMAC-SHA256 keyed by the current subkey over `label || base_nonce`. The
/// caller is responsible for zeroizing the current subkey once it has been
/// replaced.
pub fn derive_next_subkey(current: &SubKey, base_nonce: &BaseNonce) -> SubKey {
    let Ok(mut mac) = HmacSha256::new_from_slice(current.key()) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(REKEY_LABEL);
    mac.update(base_nonce.as_bytes());
    let result = mac.finalize().into_bytes();

    let mut key = [0u8; KEY_BYTES];
    key.copy_from_slice(&result);
    let next = SubKey::new(key);
    key.zeroize();
    next
}
