//! CLI error types.

use std::io;

use sealstream_core::StreamError;
use sealstream_crypto::CryptoError;
use thiserror::Error;

/// Errors surfaced by the `sealstream` commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// Reading input or writing output failed.
    ///
    /// Framing errors (truncation, authentication failure) also arrive here,
    /// wrapped by the stream reader.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Stream state machine rejected an operation
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Key file is not valid hex
    #[error("invalid key file: {reason}")]
    KeyFile {
        /// What was wrong with the file
        reason: String,
    },

    /// Password file is unusable or the key derivation parameters are
    /// rejected
    #[error("password error: {reason}")]
    Password {
        /// What was wrong
        reason: String,
    },

    /// Final chunk did not carry a decodable epilogue
    #[error("invalid epilogue: {reason}")]
    Epilogue {
        /// Decoder message
        reason: String,
    },

    /// Decrypted plaintext does not match the epilogue digest
    #[error("plaintext digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Digest recorded by the sender
        expected: String,
        /// Digest of the received plaintext
        actual: String,
    },

    /// Decrypted plaintext does not match the epilogue size
    #[error("plaintext size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Size recorded by the sender
        expected: u64,
        /// Size of the received plaintext
        actual: u64,
    },
}

impl From<CryptoError> for CliError {
    fn from(err: CryptoError) -> Self {
        Self::Stream(StreamError::from(err))
    }
}
