//! Error types for the stream state machine.
//!
//! Three classes: structural errors (wrong lengths, detected before any
//! cryptographic work), cryptographic errors (authentication failure), and
//! misuse errors (operations after finalization, unknown tags). Environment
//! failures during header generation are reported separately.

use std::io;

use sealstream_crypto::CryptoError;
use thiserror::Error;

use crate::stream::StreamPhase;

/// Errors that can occur during stream operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Header has the wrong length
    #[error("malformed header: expected {expected} bytes, got {actual}")]
    MalformedHeader {
        /// Required header length
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// Chunk length is outside the accepted range
    #[error("malformed chunk: {length} bytes is outside the accepted range")]
    MalformedChunk {
        /// Length received
        length: usize,
    },

    /// Chunk failed verification (tamper, corruption, wrong key, reordering
    /// or tag substitution). The stream state is unchanged.
    #[error("chunk authentication failed")]
    AuthenticationFailed,

    /// Operation attempted in a phase that does not allow it
    #[error("invalid phase: cannot {operation} in {phase:?}")]
    InvalidPhase {
        /// Phase when the error occurred
        phase: StreamPhase,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Unrecognized tag constant
    #[error("invalid tag: {0:#04x}")]
    InvalidTag(u8),

    /// Plaintext exceeds the configured chunk limit
    #[error("message too long: {len} bytes exceeds maximum {max}")]
    MessageTooLong {
        /// Plaintext length
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Session key has the wrong length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },

    /// Secure random source failed while generating a header
    #[error("secure random source unavailable: {reason}")]
    SecureRandomUnavailable {
        /// Reason reported by the source
        reason: String,
    },
}

impl StreamError {
    /// Returns true if this error is fatal for the caller.
    ///
    /// `AuthenticationFailed` leaves the stream untouched, so a transport with
    /// its own resynchronization may redeliver the same chunk. Everything else
    /// is a caller bug or an environment failure and must not be retried.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AuthenticationFailed)
    }
}

impl From<CryptoError> for StreamError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::AuthenticationFailed => Self::AuthenticationFailed,
            CryptoError::ChunkTooShort { actual, .. } => Self::MalformedChunk { length: actual },
            CryptoError::InvalidKeyLength { expected, actual } => {
                Self::InvalidKeyLength { expected, actual }
            },
            CryptoError::RandomUnavailable { reason } => Self::SecureRandomUnavailable { reason },
        }
    }
}

/// Convert `StreamError` to `io::Error` for the framing adapters.
///
/// The original error is kept as the source, so callers can recover it with
/// `get_ref()` and `downcast_ref::<StreamError>()`.
impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::SecureRandomUnavailable { .. } => io::ErrorKind::Other,
            StreamError::InvalidKeyLength { .. } | StreamError::MessageTooLong { .. } => {
                io::ErrorKind::InvalidInput
            },
            StreamError::MalformedHeader { .. }
            | StreamError::MalformedChunk { .. }
            | StreamError::AuthenticationFailed
            | StreamError::InvalidPhase { .. }
            | StreamError::InvalidTag(_) => io::ErrorKind::InvalidData,
        };
        Self::new(kind, err)
    }
}
