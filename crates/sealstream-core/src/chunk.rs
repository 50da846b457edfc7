//! Boundary tags and the chunk wire type.

use sealstream_crypto::ABYTES;

use crate::error::StreamError;

/// Boundary tag carried (encrypted) inside every chunk.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Ordinary chunk; no boundary information
    Message = 0x00,
    /// End of a logical message, not of the stream
    Push = 0x01,
    /// Last chunk of the current epoch; both sides rotate the subkey after it
    Rekey = 0x02,
    /// Last chunk of the stream
    Final = 0x03,
}

impl Tag {
    /// Wire value of this tag.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Tag for a wire value. `None` if unrecognized.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Message),
            0x01 => Some(Self::Push),
            0x02 => Some(Self::Rekey),
            0x03 => Some(Self::Final),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = StreamError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(StreamError::InvalidTag(value))
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> Self {
        tag.to_u8()
    }
}

/// One sealed chunk as it travels on the wire: `ciphertext || auth_tag`.
///
/// The boundary tag is inside the ciphertext; it is only learned by a
/// receiver that successfully authenticates the chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    bytes: Vec<u8>,
}

impl Chunk {
    /// Wrap received wire bytes. Length is validated by `pull`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into wire bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Wire length (plaintext length plus `ABYTES`).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the chunk carries no bytes at all (never true for a pushed
    /// chunk).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Plaintext length (wire length minus per-chunk overhead).
    pub fn plaintext_len(&self) -> usize {
        self.bytes.len().saturating_sub(ABYTES)
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
