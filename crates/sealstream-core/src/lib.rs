//! Sealstream core state machine.
//!
//! Turns one session key into an ordered sequence of authenticated, encrypted
//! chunks. Each chunk carries a boundary tag, is bound to its position in the
//! stream, and may be bound to caller-supplied associated data. Truncation,
//! reordering, duplication, tag substitution and tampering are all detected by
//! the receiver.
//!
//! # Architecture
//!
//! Pure logic over [`sealstream_crypto`]: no sockets, no files, no clocks.
//! Randomness for the header comes from an injected [`Environment`], so tests
//! drive the whole stream with a seeded source.
//!
//! ```text
//! sender                                         receiver
//! initialize_sender ──── header (24 bytes) ────> initialize_receiver
//! push(m0, Message) ──── chunk 0 ──────────────> pull → (m0, Message)
//! push(m1, Rekey)   ──── chunk 1 ──────────────> pull → (m1, Rekey)   both rotate
//! push(m2, Final)   ──── chunk 2 ──────────────> pull → (m2, Final)   both finalize
//! ```
//!
//! # Components
//!
//! - [`SecretStream`]: one direction of a stream, typed by [`Push`] or
//!   [`Pull`]
//! - [`header`]: header generation and parsing
//! - [`nonce`]: per-chunk nonce sequencing
//! - [`rekey`]: forced and explicit subkey rotation
//! - [`io`]: length-prefixed framing over `std::io`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod header;
pub mod io;
pub mod nonce;
pub mod rekey;
pub mod stream;

pub use chunk::{Chunk, Tag};
pub use config::{DEFAULT_MAX_CHUNK_LEN, StreamConfig};
pub use error::StreamError;
pub use header::{HEADER_BYTES, Header, generate_header, parse_header};
pub use io::{LENGTH_PREFIX_BYTES, StreamReader, StreamWriter};
pub use nonce::{COUNTER_MAX, next_nonce};
pub use rekey::{MAX_REKEY_INTERVAL, REKEY_SAFETY_MARGIN, RekeyScheduler};
pub use sealstream_crypto::{ABYTES, Environment, SeededEnv, SessionKey, SystemEnv};
pub use stream::{
    Direction, Pull, Push, SecretStream, StreamPhase, initialize_receiver, initialize_sender,
};
