//! Password-derived session keys.
//!
//! A password-protected stream starts with a preamble that lets the receiver
//! rerun the derivation:
//!
//! ```text
//! ┌────────────┬───────────────┬──────────────┬──────────────┬─────────────┐
//! │ salt (16)  │ m_cost (u32)  │ t_cost (u32) │ p_cost (u32) │ header ...  │
//! └────────────┴───────────────┴──────────────┴──────────────┴─────────────┘
//! ```
//!
//! The session key is Argon2id(password, salt) under the recorded costs. The
//! preamble is public; a tampered preamble yields a different key and the
//! first chunk fails authentication.

use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
};

use argon2::{Algorithm, Argon2, Params, Version};
use sealstream_crypto::{Environment, KEY_BYTES, SessionKey};
use zeroize::Zeroizing;

use crate::error::CliError;

/// Salt length in bytes.
pub const SALT_BYTES: usize = 16;

/// Preamble length: salt plus three big-endian `u32` costs.
pub const PREAMBLE_BYTES: usize = SALT_BYTES + 3 * 4;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    /// Memory cost in KiB
    pub m_cost_kib: u32,
    /// Number of passes
    pub t_cost: u32,
    /// Degree of parallelism
    pub p_cost: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self { m_cost_kib: 64 * 1024, t_cost: 3, p_cost: 1 }
    }
}

impl PasswordParams {
    /// Largest memory cost a receiver will honour (4 GiB).
    pub const MAX_M_COST_KIB: u32 = 4 * 1024 * 1024;
    /// Largest pass count a receiver will honour.
    pub const MAX_T_COST: u32 = 64;
    /// Largest parallelism a receiver will honour.
    pub const MAX_P_COST: u32 = 16;

    /// Check the costs against the receiver limits and Argon2's own bounds.
    ///
    /// # Errors
    ///
    /// - `Password` if any cost is out of range
    pub fn validate(self) -> Result<Params, CliError> {
        if self.m_cost_kib > Self::MAX_M_COST_KIB
            || self.t_cost > Self::MAX_T_COST
            || self.p_cost > Self::MAX_P_COST
        {
            return Err(CliError::Password {
                reason: format!(
                    "key derivation costs exceed limits: m_cost={} KiB, t_cost={}, p_cost={}",
                    self.m_cost_kib, self.t_cost, self.p_cost
                ),
            });
        }

        Params::new(self.m_cost_kib, self.t_cost, self.p_cost, Some(KEY_BYTES))
            .map_err(|err| CliError::Password { reason: err.to_string() })
    }
}

/// Salt and costs sent ahead of a password-protected stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    salt: [u8; SALT_BYTES],
    params: PasswordParams,
}

impl Preamble {
    /// Draw a fresh salt for `params`.
    ///
    /// # Errors
    ///
    /// - `Password` if `params` is out of range
    /// - `Stream(SecureRandomUnavailable)` if the environment has no randomness
    pub fn generate(env: &impl Environment, params: PasswordParams) -> Result<Self, CliError> {
        params.validate()?;

        let mut salt = [0u8; SALT_BYTES];
        env.random_bytes(&mut salt)?;
        Ok(Self { salt, params })
    }

    /// Cost parameters recorded in the preamble.
    pub fn params(&self) -> PasswordParams {
        self.params
    }

    /// Write the preamble in wire order.
    pub fn write_to(&self, output: &mut impl Write) -> io::Result<()> {
        let mut bytes = [0u8; PREAMBLE_BYTES];
        bytes[..SALT_BYTES].copy_from_slice(&self.salt);
        bytes[SALT_BYTES..SALT_BYTES + 4].copy_from_slice(&self.params.m_cost_kib.to_be_bytes());
        bytes[SALT_BYTES + 4..SALT_BYTES + 8].copy_from_slice(&self.params.t_cost.to_be_bytes());
        bytes[SALT_BYTES + 8..].copy_from_slice(&self.params.p_cost.to_be_bytes());
        output.write_all(&bytes)
    }

    /// Read a preamble, rejecting costs outside the receiver limits before
    /// any derivation work.
    ///
    /// # Errors
    ///
    /// - `Io(UnexpectedEof)` if the input ends inside the preamble
    /// - `Password` if the recorded costs are out of range
    pub fn read_from(input: &mut impl Read) -> Result<Self, CliError> {
        let mut bytes = [0u8; PREAMBLE_BYTES];
        input.read_exact(&mut bytes)?;

        let word = |offset: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[offset..offset + 4]);
            u32::from_be_bytes(raw)
        };

        let mut salt = [0u8; SALT_BYTES];
        salt.copy_from_slice(&bytes[..SALT_BYTES]);
        let params = PasswordParams {
            m_cost_kib: word(SALT_BYTES),
            t_cost: word(SALT_BYTES + 4),
            p_cost: word(SALT_BYTES + 8),
        };
        params.validate()?;

        Ok(Self { salt, params })
    }

    /// Run Argon2id over `password` with this preamble's salt and costs.
    ///
    /// # Errors
    ///
    /// - `Password` if the password is empty or Argon2 rejects its inputs
    pub fn derive_key(&self, password: &[u8]) -> Result<SessionKey, CliError> {
        if password.is_empty() {
            return Err(CliError::Password { reason: "password is empty".to_string() });
        }

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.validate()?);
        let mut key = Zeroizing::new([0u8; KEY_BYTES]);
        argon2
            .hash_password_into(password, &self.salt, &mut key[..])
            .map_err(|err| CliError::Password { reason: err.to_string() })?;

        tracing::debug!(
            m_cost_kib = self.params.m_cost_kib,
            t_cost = self.params.t_cost,
            p_cost = self.params.p_cost,
            "session key derived from password"
        );
        Ok(SessionKey::from_bytes(&key[..])?)
    }
}

/// Extract the password from password file contents.
///
/// One trailing line ending is stripped; everything else, including inner
/// whitespace, is part of the password.
///
/// # Errors
///
/// - `Password` if nothing is left after stripping
pub fn parse_password(contents: &[u8]) -> Result<Zeroizing<Vec<u8>>, CliError> {
    let line = contents
        .strip_suffix(b"\r\n")
        .or_else(|| contents.strip_suffix(b"\n"))
        .unwrap_or(contents);

    if line.is_empty() {
        return Err(CliError::Password { reason: "password file is empty".to_string() });
    }
    Ok(Zeroizing::new(line.to_vec()))
}

/// Read and parse a password file.
pub fn load_password(path: &Path) -> Result<Zeroizing<Vec<u8>>, CliError> {
    let contents = Zeroizing::new(fs::read(path)?);
    parse_password(&contents)
}

#[cfg(test)]
mod tests {
    use sealstream_core::StreamError;
    use sealstream_crypto::{CryptoError, SeededEnv};

    use super::*;

    fn cheap() -> PasswordParams {
        PasswordParams { m_cost_kib: 64, t_cost: 1, p_cost: 1 }
    }

    struct FailingEnv;

    impl Environment for FailingEnv {
        fn random_bytes(&self, _buffer: &mut [u8]) -> Result<(), CryptoError> {
            Err(CryptoError::RandomUnavailable { reason: "entropy exhausted".to_string() })
        }
    }

    #[test]
    fn preamble_roundtrips_and_derives_same_key() {
        let preamble = Preamble::generate(&SeededEnv::with_seed(4), cheap()).unwrap();

        let mut wire = Vec::new();
        preamble.write_to(&mut wire).unwrap();
        assert_eq!(wire.len(), PREAMBLE_BYTES);

        let parsed = Preamble::read_from(&mut wire.as_slice()).unwrap();
        assert_eq!(parsed, preamble);

        let sender = preamble.derive_key(b"correct horse").unwrap();
        let receiver = parsed.derive_key(b"correct horse").unwrap();
        assert_eq!(sender.expose_secret(), receiver.expose_secret());
    }

    #[test]
    fn different_passwords_give_different_keys() {
        let preamble = Preamble::generate(&SeededEnv::with_seed(4), cheap()).unwrap();

        let a = preamble.derive_key(b"correct horse").unwrap();
        let b = preamble.derive_key(b"battery staple").unwrap();
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn salts_differ_between_streams() {
        let env = SeededEnv::with_seed(4);
        let first = Preamble::generate(&env, cheap()).unwrap();
        let second = Preamble::generate(&env, cheap()).unwrap();

        let a = first.derive_key(b"pw").unwrap();
        let b = second.derive_key(b"pw").unwrap();
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn excessive_costs_rejected_before_derivation() {
        let mut wire = Vec::new();
        Preamble::generate(&SeededEnv::with_seed(1), cheap()).unwrap().write_to(&mut wire).unwrap();
        wire[SALT_BYTES..SALT_BYTES + 4].copy_from_slice(&u32::MAX.to_be_bytes());

        let err = Preamble::read_from(&mut wire.as_slice()).unwrap_err();
        assert!(matches!(err, CliError::Password { .. }));
    }

    #[test]
    fn costs_below_argon2_minimum_rejected() {
        let params = PasswordParams { m_cost_kib: 1, t_cost: 1, p_cost: 1 };
        let err = Preamble::generate(&SeededEnv::with_seed(1), params).unwrap_err();
        assert!(matches!(err, CliError::Password { .. }));
    }

    #[test]
    fn short_preamble_is_unexpected_eof() {
        let err = Preamble::read_from(&mut &[0u8; 10][..]).unwrap_err();
        assert!(matches!(err, CliError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn unavailable_randomness_surfaces() {
        let err = Preamble::generate(&FailingEnv, cheap()).unwrap_err();
        assert!(matches!(err, CliError::Stream(StreamError::SecureRandomUnavailable { .. })));
    }

    #[test]
    fn password_file_trailing_newline_stripped() {
        assert_eq!(parse_password(b"hunter2\n").unwrap().as_slice(), b"hunter2");
        assert_eq!(parse_password(b"hunter2\r\n").unwrap().as_slice(), b"hunter2");
        assert_eq!(parse_password(b" two words \n").unwrap().as_slice(), b" two words ");
    }

    #[test]
    fn empty_password_rejected() {
        assert!(matches!(parse_password(b"\n"), Err(CliError::Password { .. })));

        let preamble = Preamble::generate(&SeededEnv::with_seed(1), cheap()).unwrap();
        assert!(matches!(preamble.derive_key(b""), Err(CliError::Password { .. })));
    }
}
