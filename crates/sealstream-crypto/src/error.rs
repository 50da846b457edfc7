//! Error types for primitive operations

use thiserror::Error;

/// Errors from the primitive adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// AEAD verification failed (tamper, corruption or wrong key)
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Sealed chunk is shorter than the fixed per-chunk overhead
    #[error("chunk too short: expected at least {minimum} bytes, got {actual}")]
    ChunkTooShort {
        /// Minimum sealed chunk length
        minimum: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid key material length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },

    /// The secure random source could not produce bytes
    #[error("secure random source unavailable: {reason}")]
    RandomUnavailable {
        /// Reason reported by the source
        reason: String,
    },
}

impl CryptoError {
    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Authentication failures leave no state behind in this crate and may be
    /// retried by a caller holding a fresh copy of the input. Everything else
    /// is a caller bug or an environment failure.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::AuthenticationFailed => false,

            Self::ChunkTooShort { .. } => true,
            Self::InvalidKeyLength { .. } => true,
            Self::RandomUnavailable { .. } => true,
        }
    }
}
