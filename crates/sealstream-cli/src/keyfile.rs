//! Hex-encoded session key files.
//!
//! A key file holds 64 hex digits (32 bytes), optionally surrounded by
//! whitespace.

use std::{fs, io::Write, path::Path};

use sealstream_crypto::{Environment, SessionKey};
use zeroize::Zeroizing;

use crate::error::CliError;

/// Generate a fresh session key and write it to `out` as hex.
pub fn write_new_key(env: &impl Environment, out: &mut impl Write) -> Result<(), CliError> {
    let key = SessionKey::generate(env)?;
    let mut encoded = Zeroizing::new(hex::encode(key.expose_secret()));
    encoded.push('\n');

    out.write_all(encoded.as_bytes())?;
    Ok(())
}

/// Parse a session key from key file contents.
pub fn parse_key(contents: &[u8]) -> Result<SessionKey, CliError> {
    let text = std::str::from_utf8(contents)
        .map_err(|_| CliError::KeyFile { reason: "not valid UTF-8".to_string() })?;

    let bytes = Zeroizing::new(
        hex::decode(text.trim()).map_err(|err| CliError::KeyFile { reason: err.to_string() })?,
    );

    Ok(SessionKey::from_bytes(&bytes)?)
}

/// Read and parse a key file.
pub fn load_key(path: &Path) -> Result<SessionKey, CliError> {
    let contents = Zeroizing::new(fs::read(path)?);
    parse_key(&contents)
}
