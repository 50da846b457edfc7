//! Key containers
//!
//! Every container overwrites its bytes with zeros on drop. None of them
//! implement `Clone` or print their contents through `Debug`.

use std::fmt;

use zeroize::Zeroize;

use crate::{env::Environment, error::CryptoError};

/// Session key and subkey length (XChaCha20-Poly1305 key size)
pub const KEY_BYTES: usize = 32;

/// `XChaCha20` nonce length, also the length of a stream's base nonce
pub const NONCE_BYTES: usize = 24;

/// Pre-shared symmetric key for one stream.
pub struct SessionKey {
    key: [u8; KEY_BYTES],
}

impl SessionKey {
    /// Wrap an owned 32-byte key.
    pub fn from_array(key: [u8; KEY_BYTES]) -> Self {
        Self { key }
    }

    /// Copy a key out of a slice.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength` if `bytes` is not exactly 32 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_BYTES {
            return Err(CryptoError::InvalidKeyLength { expected: KEY_BYTES, actual: bytes.len() });
        }

        let mut key = [0u8; KEY_BYTES];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Draw a fresh key from the environment's secure random source.
    pub fn generate(env: &impl Environment) -> Result<Self, CryptoError> {
        let mut key = [0u8; KEY_BYTES];
        env.random_bytes(&mut key)?;
        Ok(Self { key })
    }

    /// Raw key bytes, for handing the key to its owner's storage.
    ///
    /// Stream internals never call this; it exists so that a freshly generated
    /// key can be written out by the caller that asked for it.
    pub fn expose_secret(&self) -> &[u8; KEY_BYTES] {
        &self.key
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Per-epoch encryption key derived from the session key.
///
/// Only the primitive adapter reads the key bytes.
pub struct SubKey {
    key: [u8; KEY_BYTES],
}

impl SubKey {
    pub(crate) fn new(key: [u8; KEY_BYTES]) -> Self {
        Self { key }
    }

    pub(crate) fn key(&self) -> &[u8; KEY_BYTES] {
        &self.key
    }
}

impl Zeroize for SubKey {
    fn zeroize(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for SubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubKey(<redacted>)")
    }
}

impl Drop for SubKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Stream-wide nonce prefix. Fixed for the life of a stream; the chunk
/// counter is folded into it to form each chunk's nonce.
pub struct BaseNonce {
    nonce: [u8; NONCE_BYTES],
}

impl BaseNonce {
    pub(crate) fn new(nonce: [u8; NONCE_BYTES]) -> Self {
        Self { nonce }
    }

    /// Raw base nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_BYTES] {
        &self.nonce
    }
}

impl Zeroize for BaseNonce {
    fn zeroize(&mut self) {
        self.nonce.zeroize();
    }
}

impl fmt::Debug for BaseNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BaseNonce(<redacted>)")
    }
}

impl Drop for BaseNonce {
    fn drop(&mut self) {
        self.nonce.zeroize();
    }
}

/// Initial key material of a stream: the first epoch's subkey and the base
/// nonce.
#[derive(Debug)]
pub struct StreamKeys {
    /// First epoch's subkey
    pub subkey: SubKey,
    /// Base nonce, fixed for the stream
    pub base_nonce: BaseNonce,
}
