//! Stream state machine.
//!
//! Owns the subkey, base nonce, counter and phase of one direction of a
//! stream. Every call is synchronous; there is no I/O and no internal locking.
//! `&mut self` on every mutating method is the single-writer contract.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ initialize ┌───────────┐      Final      ┌───────────┐
//! │ Init │───────────>│ Streaming │────────────────>│ Finalized │
//! └──────┘            └───────────┘                 └───────────┘
//!                       │       ▲
//!                       └───────┘
//!           Message/Push: counter += 1
//!           Rekey/forced: rotate subkey, counter = 0
//!           pull fails:   no change
//! ```
//!
//! `Init` only exists while a constructor runs; no caller can observe it.

use std::marker::PhantomData;

use sealstream_crypto::{
    ABYTES, BaseNonce, Environment, NONCE_BYTES, OpenedChunk, SessionKey, StreamKeys, SubKey,
    open_chunk, seal_chunk,
};
use zeroize::Zeroize;

use crate::{
    chunk::{Chunk, Tag},
    config::StreamConfig,
    error::StreamError,
    header::{Header, generate_header, parse_header},
    nonce::next_nonce,
    rekey::RekeyScheduler,
};

/// Stream direction marker
pub trait Direction {}

/// Sender side: encrypts with [`SecretStream::push`]
#[derive(Debug)]
pub struct Push;

/// Receiver side: decrypts with [`SecretStream::pull`]
#[derive(Debug)]
pub struct Pull;

impl Direction for Push {}
impl Direction for Pull {}

/// Lifecycle phase of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Chunks may be pushed or pulled
    Streaming,
    /// A `Final` chunk was processed; key material is gone
    Finalized,
}

/// One direction of an encrypted stream.
///
/// Key material is private to this type: there are no accessors for the
/// subkey or base nonce, and both are zeroized on rotation, on finalization
/// and on drop.
#[derive(Debug)]
pub struct SecretStream<D: Direction> {
    /// Current epoch's subkey
    subkey: SubKey,
    /// Base nonce, fixed for the stream
    base_nonce: BaseNonce,
    /// Chunks processed in the current epoch
    counter: u32,
    /// Completed rotations
    epoch: u64,
    /// Current phase
    phase: StreamPhase,
    /// Forced-rekey policy
    scheduler: RekeyScheduler,
    /// Largest plaintext accepted per chunk
    max_chunk_len: usize,
    direction: PhantomData<D>,
}

/// Start a sending stream.
///
/// Returns the header to deliver to the receiver before the first chunk.
///
/// # Errors
///
/// - `SecureRandomUnavailable` if the environment cannot produce the header
pub fn initialize_sender(
    session_key: &SessionKey,
    env: &impl Environment,
    config: StreamConfig,
) -> Result<(Header, SecretStream<Push>), StreamError> {
    let (header, keys) = generate_header(session_key, env)?;
    Ok((header, SecretStream::new(keys, config)))
}

/// Start a receiving stream from the sender's header.
///
/// `config` must match the sender's.
///
/// # Errors
///
/// - `MalformedHeader` if `header` is not exactly 24 bytes
pub fn initialize_receiver(
    session_key: &SessionKey,
    header: &[u8],
    config: StreamConfig,
) -> Result<SecretStream<Pull>, StreamError> {
    let keys = parse_header(session_key, header)?;
    Ok(SecretStream::new(keys, config))
}

impl<D: Direction> SecretStream<D> {
    fn new(keys: StreamKeys, config: StreamConfig) -> Self {
        let StreamKeys { subkey, base_nonce } = keys;
        let scheduler = RekeyScheduler::new(config.rekey_interval);

        tracing::debug!(
            rekey_interval = scheduler.ceiling(),
            max_chunk_len = config.max_chunk_len,
            "stream initialized"
        );

        Self {
            subkey,
            base_nonce,
            counter: 0,
            epoch: 0,
            phase: StreamPhase::Streaming,
            scheduler,
            max_chunk_len: config.max_chunk_len,
            direction: PhantomData,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// True once a `Final` chunk has been processed.
    pub fn is_finalized(&self) -> bool {
        self.phase == StreamPhase::Finalized
    }

    /// Chunks processed in the current epoch.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Number of completed subkey rotations.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Rotate the subkey without emitting a chunk.
    ///
    /// Both sides must call this at the same position in the stream; unlike a
    /// `Rekey` chunk, nothing on the wire tells the receiver to do it.
    ///
    /// # Errors
    ///
    /// - `InvalidPhase` if the stream is finalized
    pub fn rekey(&mut self) -> Result<(), StreamError> {
        self.ensure_streaming("rekey")?;
        self.rotate(false);
        Ok(())
    }

    /// Zeroize all key material and release the stream.
    pub fn destroy(mut self) {
        self.wipe();
    }

    fn ensure_streaming(&self, operation: &'static str) -> Result<(), StreamError> {
        if self.phase != StreamPhase::Streaming {
            return Err(StreamError::InvalidPhase { phase: self.phase, operation });
        }
        Ok(())
    }

    /// Chunk nonce for the current counter. Caller zeroizes it after use.
    fn current_nonce(&self) -> [u8; NONCE_BYTES] {
        next_nonce(self.base_nonce.as_bytes(), self.counter)
    }

    /// State transition after a chunk was sealed or authenticated.
    fn advance(&mut self, tag: Tag) {
        // The scheduler ceiling is below COUNTER_MAX and the counter resets
        // whenever it reaches the ceiling, so this cannot overflow.
        self.counter += 1;

        match tag {
            Tag::Final => self.enter_finalized(),
            Tag::Rekey => self.rotate(false),
            Tag::Message | Tag::Push => {
                if self.scheduler.should_force_rekey(self.counter) {
                    self.rotate(true);
                }
            },
        }
    }

    fn rotate(&mut self, forced: bool) {
        self.scheduler.rotate(&mut self.subkey, &self.base_nonce);
        self.counter = 0;
        self.epoch = self.epoch.saturating_add(1);

        tracing::debug!(epoch = self.epoch, forced, "subkey rotated");
    }

    fn enter_finalized(&mut self) {
        self.phase = StreamPhase::Finalized;
        self.wipe();

        tracing::debug!(epoch = self.epoch, counter = self.counter, "stream finalized");
    }

    fn wipe(&mut self) {
        self.subkey.zeroize();
        self.base_nonce.zeroize();
    }
}

impl SecretStream<Push> {
    /// Encrypt one chunk.
    ///
    /// `associated_data` is authenticated but not encrypted; the receiver must
    /// supply the same bytes to `pull`. `Rekey` ends the current epoch after
    /// this chunk; `Final` ends the stream.
    ///
    /// # Errors
    ///
    /// - `InvalidPhase` if the stream is finalized
    /// - `MessageTooLong` if `plaintext` exceeds the configured chunk limit
    pub fn push(
        &mut self,
        plaintext: &[u8],
        tag: Tag,
        associated_data: Option<&[u8]>,
    ) -> Result<Chunk, StreamError> {
        self.ensure_streaming("push")?;

        if plaintext.len() > self.max_chunk_len {
            return Err(StreamError::MessageTooLong {
                len: plaintext.len(),
                max: self.max_chunk_len,
            });
        }

        let mut nonce = self.current_nonce();
        let sealed = seal_chunk(
            &self.subkey,
            &nonce,
            tag.to_u8(),
            plaintext,
            associated_data.unwrap_or_default(),
        );
        nonce.zeroize();

        self.advance(tag);
        Ok(Chunk::from_bytes(sealed))
    }

    /// Encrypt the last chunk of the stream.
    ///
    /// Shorthand for `push(plaintext, Tag::Final, associated_data)`. Key
    /// material is zeroized once the chunk is sealed.
    ///
    /// # Errors
    ///
    /// - Everything [`push`](Self::push) returns
    pub fn finalize(
        &mut self,
        plaintext: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Chunk, StreamError> {
        self.push(plaintext, Tag::Final, associated_data)
    }

    /// Encrypt one chunk with a raw tag constant.
    ///
    /// # Errors
    ///
    /// - `InvalidTag` if `tag` is not a known tag value
    /// - Everything [`push`](Self::push) returns
    pub fn push_raw(
        &mut self,
        plaintext: &[u8],
        tag: u8,
        associated_data: Option<&[u8]>,
    ) -> Result<Chunk, StreamError> {
        let tag = Tag::try_from(tag)?;
        self.push(plaintext, tag, associated_data)
    }
}

impl SecretStream<Pull> {
    /// Verify and decrypt the next chunk.
    ///
    /// On any error the stream is left exactly as it was: the counter does not
    /// advance and no rotation happens.
    ///
    /// # Errors
    ///
    /// - `InvalidPhase` if the stream is finalized
    /// - `MalformedChunk` if the length is outside `ABYTES..=max_chunk_len +
    ///   ABYTES` (checked before any crypto)
    /// - `AuthenticationFailed` on tamper, corruption, wrong key, wrong
    ///   associated data, or a chunk delivered out of order
    /// - `InvalidTag` if an authentic chunk carries an unknown tag value
    pub fn pull(
        &mut self,
        chunk: impl AsRef<[u8]>,
        associated_data: Option<&[u8]>,
    ) -> Result<(Vec<u8>, Tag), StreamError> {
        self.ensure_streaming("pull")?;

        let sealed = chunk.as_ref();
        let max_sealed_len = self.max_chunk_len.saturating_add(ABYTES);
        if sealed.len() < ABYTES || sealed.len() > max_sealed_len {
            return Err(StreamError::MalformedChunk { length: sealed.len() });
        }

        let mut nonce = self.current_nonce();
        let opened =
            open_chunk(&self.subkey, &nonce, sealed, associated_data.unwrap_or_default());
        nonce.zeroize();

        let OpenedChunk { tag, mut plaintext } = opened.map_err(|err| {
            tracing::warn!(
                epoch = self.epoch,
                counter = self.counter,
                len = sealed.len(),
                "chunk failed authentication"
            );
            StreamError::from(err)
        })?;

        let Some(tag) = Tag::from_u8(tag) else {
            plaintext.zeroize();
            return Err(StreamError::InvalidTag(tag));
        };

        self.advance(tag);
        Ok((plaintext, tag))
    }
}
