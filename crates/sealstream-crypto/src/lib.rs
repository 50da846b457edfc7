//! Sealstream Cryptographic Primitives
//!
//! The primitive adapter beneath the sealstream state machine. Pure functions
//! with deterministic outputs; randomness comes from an injected
//! [`Environment`].
//!
//! # Key Schedule
//!
//! ```text
//! Session Key + Header (public, random)
//!        │
//!        ▼
//! HKDF-SHA256 → Subkey[0] + Base Nonce
//!        │
//!        ▼ HMAC-SHA256 (on rekey)
//! Subkey[1], Subkey[2], ...
//!        │
//!        ▼
//! XChaCha20-Poly1305(subkey, base_nonce ⊕ counter) → Sealed Chunk
//! ```
//!
//! # Security
//!
//! Confidentiality and integrity:
//! - XChaCha20-Poly1305 AEAD over `tag || plaintext`
//! - Associated data is bound into every chunk's Poly1305 tag
//!
//! Key hygiene:
//! - Every key container zeroizes on drop
//! - Rotation is one-way: a subkey does not reveal its predecessor
//! - No container implements `Clone` or prints its bytes

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod derivation;
pub mod env;
pub mod error;
pub mod keys;

pub use aead::{ABYTES, OpenedChunk, TAG_BYTES, open_chunk, seal_chunk};
pub use derivation::{derive_next_subkey, derive_stream_keys};
pub use env::{Environment, SeededEnv, SystemEnv};
pub use error::CryptoError;
pub use keys::{BaseNonce, KEY_BYTES, NONCE_BYTES, SessionKey, StreamKeys, SubKey};
