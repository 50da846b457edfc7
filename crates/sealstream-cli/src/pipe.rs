//! Encrypt and decrypt byte streams.
//!
//! Ciphertext layout is the framed stream from [`sealstream_core::io`]. Every
//! data chunk is tagged `Message`; the `Final` chunk carries a CBOR
//! [`Epilogue`] with the SHA-256 digest and size of the plaintext, checked by
//! the receiver after the last data chunk.

use std::io::{self, Read, Write};

use sealstream_core::{SessionKey, StreamConfig, StreamReader, StreamWriter, Tag};
use sealstream_crypto::Environment;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{
    error::CliError,
    password::{PasswordParams, Preamble},
};

/// Plaintext summary sent in the final chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epilogue {
    /// Hex-encoded SHA-256 of the plaintext
    pub sha256: String,
    /// Plaintext length in bytes
    pub size: u64,
}

impl Epilogue {
    fn encode(&self) -> Result<Vec<u8>, CliError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|err| CliError::Epilogue { reason: err.to_string() })?;
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CliError> {
        ciborium::from_reader(bytes).map_err(|err| CliError::Epilogue { reason: err.to_string() })
    }
}

/// Encrypt everything from `input` into `output`.
///
/// Plaintext is cut into chunks of `chunk_size` bytes (the last one may be
/// shorter). `config.max_chunk_len` must be at least `chunk_size` and large
/// enough for the encoded epilogue.
pub fn encrypt(
    mut input: impl Read,
    output: impl Write,
    key: &SessionKey,
    env: &impl Environment,
    config: StreamConfig,
    chunk_size: usize,
) -> Result<Epilogue, CliError> {
    let mut writer = StreamWriter::new(output, key, env, config)?;
    let mut hasher = Sha256::new();
    let mut buffer = Zeroizing::new(vec![0u8; chunk_size.max(1)]);
    let mut size = 0u64;

    loop {
        let count = fill(&mut input, &mut buffer)?;
        if count == 0 {
            break;
        }

        writer.write_chunk(&buffer[..count], Tag::Message)?;
        hasher.update(&buffer[..count]);
        size += count as u64;

        if count < buffer.len() {
            break;
        }
    }

    let epilogue = Epilogue { sha256: hex::encode(hasher.finalize()), size };
    let chunks = writer.stream().counter();
    writer.finish(&epilogue.encode()?)?;

    tracing::debug!(size, chunks, "stream encrypted");
    Ok(epilogue)
}

/// Decrypt a framed stream from `input` into `output`.
///
/// Plaintext is written as each chunk authenticates. The epilogue is checked
/// once the `Final` chunk arrives; on mismatch `output` has already received
/// the (authentic) chunks and the caller must discard it.
pub fn decrypt(
    input: impl Read,
    mut output: impl Write,
    key: &SessionKey,
    config: StreamConfig,
) -> Result<Epilogue, CliError> {
    let mut reader = StreamReader::new(input, key, config)?;
    let mut hasher = Sha256::new();
    let mut size = 0u64;

    let trailer = loop {
        match reader.read_chunk()? {
            Some((trailer, Tag::Final)) => break trailer,
            Some((plaintext, _)) => {
                let plaintext = Zeroizing::new(plaintext);
                output.write_all(&plaintext)?;
                hasher.update(&plaintext[..]);
                size += plaintext.len() as u64;
            },
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended without final chunk",
                )
                .into());
            },
        }
    };
    output.flush()?;

    let epilogue = Epilogue::decode(&trailer)?;
    let actual = hex::encode(hasher.finalize());

    if epilogue.size != size {
        return Err(CliError::SizeMismatch { expected: epilogue.size, actual: size });
    }
    if epilogue.sha256 != actual {
        return Err(CliError::DigestMismatch { expected: epilogue.sha256, actual });
    }

    tracing::debug!(size, "stream decrypted");
    Ok(epilogue)
}

/// Encrypt under a key derived from `password`.
///
/// Writes a fresh [`Preamble`] ahead of the stream header.
pub fn encrypt_with_password(
    input: impl Read,
    mut output: impl Write,
    password: &[u8],
    env: &impl Environment,
    params: PasswordParams,
    config: StreamConfig,
    chunk_size: usize,
) -> Result<Epilogue, CliError> {
    let preamble = Preamble::generate(env, params)?;
    let key = preamble.derive_key(password)?;

    preamble.write_to(&mut output)?;
    encrypt(input, output, &key, env, config, chunk_size)
}

/// Decrypt a stream written by [`encrypt_with_password`].
///
/// A wrong password surfaces as an authentication failure on the first chunk.
pub fn decrypt_with_password(
    mut input: impl Read,
    output: impl Write,
    password: &[u8],
    config: StreamConfig,
) -> Result<Epilogue, CliError> {
    let preamble = Preamble::read_from(&mut input)?;
    let key = preamble.derive_key(password)?;

    decrypt(input, output, &key, config)
}

/// Read until `buffer` is full or `input` is exhausted.
fn fill(input: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match input.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(count) => filled += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {},
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
