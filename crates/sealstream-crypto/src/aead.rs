//! Chunk sealing using `XChaCha20-Poly1305`
//!
//! The chunk's boundary tag travels as the first byte of the encrypted
//! message, so it is covered by the Poly1305 tag and never appears in the
//! clear. Wire layout of a sealed chunk:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┬──────────────────┐
//! │ Enc(tag) 1 byte  │ Enc(plaintext) N bytes   │ Poly1305 16 bytes│
//! └──────────────────┴──────────────────────────┴──────────────────┘
//! ```
//!
//! All functions are pure. Nonces are supplied by the caller.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use zeroize::Zeroize;

use crate::{
    error::CryptoError,
    keys::{NONCE_BYTES, SubKey},
};

/// Poly1305 tag size (16 bytes)
pub const TAG_BYTES: usize = 16;

/// Per-chunk overhead: one encrypted tag byte plus the Poly1305 tag
pub const ABYTES: usize = 1 + TAG_BYTES;

/// A successfully opened chunk.
#[derive(Debug, PartialEq, Eq)]
pub struct OpenedChunk {
    /// Raw boundary tag byte, authenticated but not yet validated
    pub tag: u8,
    /// Decrypted plaintext
    pub plaintext: Vec<u8>,
}

/// Seal `tag || plaintext` under `subkey` and `nonce`, authenticating `aad`.
///
/// Returns `plaintext.len() + ABYTES` bytes.
///
/// # Security
///
/// - Caller MUST never reuse a (subkey, nonce) pair
/// - The temporary `tag || plaintext` buffer is zeroized before returning
pub fn seal_chunk(
    subkey: &SubKey,
    nonce: &[u8; NONCE_BYTES],
    tag: u8,
    plaintext: &[u8],
    aad: &[u8],
) -> Vec<u8> {
    let mut message = Vec::with_capacity(plaintext.len() + 1);
    message.push(tag);
    message.extend_from_slice(plaintext);

    let cipher = XChaCha20Poly1305::new(subkey.key().into());
    let Ok(ciphertext) =
        cipher.encrypt(XNonce::from_slice(nonce), Payload { msg: &message, aad })
    else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    message.zeroize();
    ciphertext
}

/// Open a sealed chunk.
///
/// # Errors
///
/// - `ChunkTooShort`: fewer than `ABYTES` bytes (checked before any crypto)
/// - `AuthenticationFailed`: tag mismatch (tamper, wrong key, wrong nonce or
///   wrong associated data)
pub fn open_chunk(
    subkey: &SubKey,
    nonce: &[u8; NONCE_BYTES],
    sealed: &[u8],
    aad: &[u8],
) -> Result<OpenedChunk, CryptoError> {
    if sealed.len() < ABYTES {
        return Err(CryptoError::ChunkTooShort { minimum: ABYTES, actual: sealed.len() });
    }

    let cipher = XChaCha20Poly1305::new(subkey.key().into());
    let mut message = cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: sealed, aad })
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let plaintext = message.split_off(1);
    let tag = message[0];
    message.zeroize();

    Ok(OpenedChunk { tag, plaintext })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derivation::derive_stream_keys, keys::SessionKey};

    fn test_subkey(fill: u8) -> SubKey {
        let keys = derive_stream_keys(&SessionKey::from_array([fill; 32]), &[fill; 24]);
        keys.subkey
    }

    #[test]
    fn seal_open_roundtrip() {
        let subkey = test_subkey(1);
        let nonce = [0xAB; NONCE_BYTES];

        let sealed = seal_chunk(&subkey, &nonce, 0x02, b"Hello, World!", b"");
        let opened = open_chunk(&subkey, &nonce, &sealed, b"").unwrap();

        assert_eq!(opened.tag, 0x02);
        assert_eq!(opened.plaintext, b"Hello, World!");
    }

    #[test]
    fn seal_open_empty_message() {
        let subkey = test_subkey(2);
        let nonce = [0x00; NONCE_BYTES];

        let sealed = seal_chunk(&subkey, &nonce, 0x03, b"", b"");
        assert_eq!(sealed.len(), ABYTES);

        let opened = open_chunk(&subkey, &nonce, &sealed, b"").unwrap();
        assert_eq!(opened.tag, 0x03);
        assert!(opened.plaintext.is_empty());
    }

    #[test]
    fn sealed_length_is_plaintext_plus_overhead() {
        let subkey = test_subkey(3);
        let plaintext = vec![0x42u8; 64 * 1024]; // 64KB

        let sealed = seal_chunk(&subkey, &[0x11; NONCE_BYTES], 0, &plaintext, b"");
        assert_eq!(sealed.len(), plaintext.len() + ABYTES);
    }

    #[test]
    fn wrong_nonce_fails() {
        let subkey = test_subkey(4);
        let sealed = seal_chunk(&subkey, &[0x00; NONCE_BYTES], 0, b"payload", b"");

        let result = open_chunk(&subkey, &[0x01; NONCE_BYTES], &sealed, b"");
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn wrong_key_fails() {
        let nonce = [0x00; NONCE_BYTES];
        let sealed = seal_chunk(&test_subkey(5), &nonce, 0, b"secret message", b"");

        let result = open_chunk(&test_subkey(6), &nonce, &sealed, b"");
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn associated_data_is_authenticated() {
        let subkey = test_subkey(7);
        let nonce = [0x09; NONCE_BYTES];
        let sealed = seal_chunk(&subkey, &nonce, 0, b"payload", b"context-a");

        assert!(open_chunk(&subkey, &nonce, &sealed, b"context-a").is_ok());
        assert_eq!(
            open_chunk(&subkey, &nonce, &sealed, b"context-b"),
            Err(CryptoError::AuthenticationFailed)
        );
    }

    #[test]
    fn tampered_tag_byte_fails() {
        let subkey = test_subkey(8);
        let nonce = [0x00; NONCE_BYTES];
        let mut sealed = seal_chunk(&subkey, &nonce, 0x00, b"original message", b"");

        // Flipping the encrypted tag byte must not yield a different tag
        sealed[0] ^= 0x03;

        assert_eq!(open_chunk(&subkey, &nonce, &sealed, b""), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn short_input_rejected_before_crypto() {
        let subkey = test_subkey(9);
        let result = open_chunk(&subkey, &[0x00; NONCE_BYTES], &[0u8; ABYTES - 1], b"");

        assert_eq!(result, Err(CryptoError::ChunkTooShort { minimum: ABYTES, actual: ABYTES - 1 }));
    }
}
