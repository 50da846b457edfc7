//! Stream header codec.
//!
//! The header is 24 public random bytes sent once before the first chunk. It
//! salts the derivation of the stream's first subkey and base nonce, so two
//! streams under the same session key never share key material.

use sealstream_crypto::{Environment, SessionKey, StreamKeys, derive_stream_keys};

use crate::error::StreamError;

/// Header length in bytes.
pub const HEADER_BYTES: usize = 24;

/// Public per-stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header([u8; HEADER_BYTES]);

impl Header {
    /// Size of the serialized header (24 bytes)
    pub const SIZE: usize = HEADER_BYTES;

    /// Parse a header from wire bytes.
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` if `bytes` is not exactly 24 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StreamError> {
        let Ok(header) = <[u8; HEADER_BYTES]>::try_from(bytes) else {
            return Err(StreamError::MalformedHeader {
                expected: HEADER_BYTES,
                actual: bytes.len(),
            });
        };
        Ok(Self(header))
    }

    /// Wire bytes.
    pub fn as_bytes(&self) -> &[u8; HEADER_BYTES] {
        &self.0
    }

    /// Wire bytes as an owned buffer.
    pub fn to_vec(self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl AsRef<[u8]> for Header {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Generate a fresh header and derive the stream's initial keys.
///
/// # Errors
///
/// - `SecureRandomUnavailable` if the environment cannot produce random bytes
pub fn generate_header(
    session_key: &SessionKey,
    env: &impl Environment,
) -> Result<(Header, StreamKeys), StreamError> {
    let mut bytes = [0u8; HEADER_BYTES];
    env.random_bytes(&mut bytes)?;

    let header = Header(bytes);
    let keys = derive_stream_keys(session_key, header.as_bytes());
    Ok((header, keys))
}

/// Derive the stream's initial keys from a received header.
///
/// Deterministic: the same key and header always give the same keys.
///
/// # Errors
///
/// - `MalformedHeader` if `header_bytes` is not exactly 24 bytes (nothing is
///   derived)
pub fn parse_header(
    session_key: &SessionKey,
    header_bytes: &[u8],
) -> Result<StreamKeys, StreamError> {
    let header = Header::from_bytes(header_bytes)?;
    Ok(derive_stream_keys(session_key, header.as_bytes()))
}
