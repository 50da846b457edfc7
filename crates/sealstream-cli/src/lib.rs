//! Sealstream command-line pipe.
//!
//! Library half of the `sealstream` binary: key file handling and the
//! encrypt/decrypt pipelines, kept free of argument parsing so they can be
//! driven from tests with in-memory buffers.
//!
//! # Ciphertext Format
//!
//! ```text
//! [preamble (28)] │ header (24) │ len │ chunk │ ... │ len │ final chunk (CBOR epilogue)
//! ```
//!
//! The preamble (Argon2id salt and costs) is present only when the session
//! key comes from a password file.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use sealstream_core::DEFAULT_MAX_CHUNK_LEN;

pub mod error;
pub mod keyfile;
pub mod password;
pub mod pipe;

pub use error::CliError;
pub use keyfile::{load_key, parse_key, write_new_key};
pub use password::{PasswordParams, Preamble, load_password, parse_password};
pub use pipe::{Epilogue, decrypt, decrypt_with_password, encrypt, encrypt_with_password};

/// Smallest accepted chunk size; the epilogue must always fit in one chunk.
pub const MIN_CHUNK_SIZE: usize = 256;

/// Largest accepted chunk size, shared by `encrypt` and `decrypt` so that
/// anything the encryptor writes fits the decryptor's default limit.
pub const MAX_CHUNK_SIZE: usize = DEFAULT_MAX_CHUNK_LEN;

/// Default plaintext bytes per chunk when encrypting.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Parse a chunk size argument, bounded by `MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE`.
///
/// # Errors
///
/// Returns a message for clap if the value is not a number or out of range.
pub fn parse_chunk_size(value: &str) -> Result<usize, String> {
    let size: usize = value.parse().map_err(|err: std::num::ParseIntError| err.to_string())?;
    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&size) {
        return Err(format!(
            "chunk size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE} bytes"
        ));
    }
    Ok(size)
}
