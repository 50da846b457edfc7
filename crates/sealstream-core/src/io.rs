//! Length-prefixed framing over `std::io`.
//!
//! Stream layout:
//!
//! ```text
//! ┌──────────────┬───────────────────┬──────────┬───────────────────┬─────┐
//! │ header (24)  │ len (u32 BE)      │ chunk    │ len (u32 BE)      │ ... │
//! └──────────────┴───────────────────┴──────────┴───────────────────┴─────┘
//! ```
//!
//! The last chunk carries `Final`; its plaintext is an application trailer
//! (empty if the writer had nothing to add). A reader that hits EOF before the
//! `Final` chunk reports `UnexpectedEof`, so truncation is never silent.
//!
//! Length prefixes are not authenticated on their own. A corrupted prefix
//! either exceeds the configured maximum (`MalformedChunk`) or shifts chunk
//! boundaries, which fails authentication.

use std::io::{self, Read, Write};

use sealstream_crypto::{ABYTES, Environment, SessionKey};
use zeroize::Zeroize;

use crate::{
    chunk::Tag,
    config::StreamConfig,
    error::StreamError,
    header::HEADER_BYTES,
    stream::{Pull, Push, SecretStream, initialize_receiver, initialize_sender},
};

/// Size of the big-endian length prefix before every chunk.
pub const LENGTH_PREFIX_BYTES: usize = 4;

/// Encrypting writer.
///
/// Writes the header on construction and one framed chunk per
/// [`write_chunk`](Self::write_chunk). Dropping the writer without calling
/// [`finish`](Self::finish) leaves a stream that readers reject as truncated.
pub struct StreamWriter<W: Write> {
    inner: W,
    stream: SecretStream<Push>,
    max_chunk_len: usize,
}

impl<W: Write> StreamWriter<W> {
    /// Start a stream on `inner`, writing its header.
    ///
    /// Fails with `InvalidInput` if `config.max_chunk_len` is zero, since the
    /// [`Write`] impl could never make progress.
    pub fn new(
        mut inner: W,
        session_key: &SessionKey,
        env: &impl Environment,
        config: StreamConfig,
    ) -> io::Result<Self> {
        if config.max_chunk_len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "max_chunk_len must be at least 1 byte",
            ));
        }

        let (header, stream) = initialize_sender(session_key, env, config)?;
        inner.write_all(header.as_bytes())?;
        Ok(Self { inner, stream, max_chunk_len: config.max_chunk_len })
    }

    /// Encrypt `data` and write it as one framed chunk.
    pub fn write_chunk(&mut self, data: &[u8], tag: Tag) -> io::Result<()> {
        let chunk = self.stream.push(data, tag, None)?;
        let Ok(length) = u32::try_from(chunk.len()) else {
            return Err(StreamError::MessageTooLong {
                len: data.len(),
                max: u32::MAX as usize - ABYTES,
            }
            .into());
        };

        self.inner.write_all(&length.to_be_bytes())?;
        self.inner.write_all(chunk.as_bytes())?;
        Ok(())
    }

    /// Write the `Final` chunk carrying `trailer`, flush, and return the inner
    /// writer.
    pub fn finish(mut self, trailer: &[u8]) -> io::Result<W> {
        self.write_chunk(trailer, Tag::Final)?;
        self.inner.flush()?;

        let Self { inner, stream, .. } = self;
        stream.destroy();
        Ok(inner)
    }

    /// Underlying stream state (phase, counters).
    pub fn stream(&self) -> &SecretStream<Push> {
        &self.stream
    }
}

impl<W: Write> Write for StreamWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let size = buf.len().min(self.max_chunk_len);
        self.write_chunk(&buf[..size], Tag::Message)?;
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decrypting reader.
///
/// [`Read`] yields the plaintext of every non-`Final` chunk in order and
/// reports EOF after the `Final` chunk; the `Final` chunk's plaintext is kept
/// as the [`trailer`](Self::trailer).
pub struct StreamReader<R: Read> {
    inner: R,
    stream: SecretStream<Pull>,
    max_sealed_len: usize,
    buffer: Vec<u8>,
    position: usize,
    trailer: Option<Vec<u8>>,
}

impl<R: Read> StreamReader<R> {
    /// Read the header from `inner` and start a receiving stream.
    pub fn new(mut inner: R, session_key: &SessionKey, config: StreamConfig) -> io::Result<Self> {
        let mut header = [0u8; HEADER_BYTES];
        inner.read_exact(&mut header)?;

        let stream = initialize_receiver(session_key, &header, config)?;
        Ok(Self {
            inner,
            stream,
            max_sealed_len: config.max_chunk_len.saturating_add(ABYTES),
            buffer: Vec::new(),
            position: 0,
            trailer: None,
        })
    }

    /// Read, verify and decrypt the next framed chunk.
    ///
    /// Returns `None` once the `Final` chunk has been read.
    pub fn read_chunk(&mut self) -> io::Result<Option<(Vec<u8>, Tag)>> {
        if self.stream.is_finalized() {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX_BYTES];
        self.inner.read_exact(&mut prefix).map_err(truncated)?;

        let length = u32::from_be_bytes(prefix) as usize;
        if !(ABYTES..=self.max_sealed_len).contains(&length) {
            return Err(StreamError::MalformedChunk { length }.into());
        }

        let mut sealed = vec![0u8; length];
        self.inner.read_exact(&mut sealed).map_err(truncated)?;

        let (plaintext, tag) = self.stream.pull(&sealed, None)?;
        Ok(Some((plaintext, tag)))
    }

    /// Plaintext of the `Final` chunk, once reached through [`Read`].
    pub fn trailer(&self) -> Option<&[u8]> {
        self.trailer.as_deref()
    }

    /// True once the `Final` chunk has been verified.
    pub fn is_finished(&self) -> bool {
        self.stream.is_finalized()
    }

    /// Underlying stream state (phase, counters).
    pub fn stream(&self) -> &SecretStream<Pull> {
        &self.stream
    }
}

impl<R: Read> Read for StreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.position < self.buffer.len() {
                let available = &self.buffer[self.position..];
                let size = available.len().min(buf.len());
                buf[..size].copy_from_slice(&available[..size]);
                self.position += size;
                return Ok(size);
            }

            match self.read_chunk()? {
                None => return Ok(0),
                Some((plaintext, Tag::Final)) => {
                    self.trailer = Some(plaintext);
                    return Ok(0);
                },
                Some((plaintext, _)) => {
                    self.buffer.zeroize();
                    self.buffer = plaintext;
                    self.position = 0;
                },
            }
        }
    }
}

impl<R: Read> Drop for StreamReader<R> {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}

/// EOF in the middle of a stream means it was cut short.
fn truncated(err: io::Error) -> io::Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        io::Error::new(io::ErrorKind::UnexpectedEof, "stream truncated before final chunk")
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use sealstream_crypto::SeededEnv;

    use super::*;

    fn key() -> SessionKey {
        SessionKey::from_array([0x42; 32])
    }

    fn encrypt(chunks: &[&[u8]], trailer: &[u8], config: StreamConfig) -> Vec<u8> {
        let mut writer =
            StreamWriter::new(Vec::new(), &key(), &SeededEnv::with_seed(5), config).unwrap();
        for chunk in chunks {
            writer.write_chunk(chunk, Tag::Message).unwrap();
        }
        writer.finish(trailer).unwrap()
    }

    #[test]
    fn framed_roundtrip() {
        let config = StreamConfig::default();
        let wire = encrypt(&[b"alpha", b"", b"gamma"], b"trailer", config);

        let mut reader = StreamReader::new(wire.as_slice(), &key(), config).unwrap();
        assert_eq!(reader.read_chunk().unwrap(), Some((b"alpha".to_vec(), Tag::Message)));
        assert_eq!(reader.read_chunk().unwrap(), Some((Vec::new(), Tag::Message)));
        assert_eq!(reader.read_chunk().unwrap(), Some((b"gamma".to_vec(), Tag::Message)));
        assert_eq!(reader.read_chunk().unwrap(), Some((b"trailer".to_vec(), Tag::Final)));
        assert_eq!(reader.read_chunk().unwrap(), None);
        assert!(reader.is_finished());
    }

    #[test]
    fn wire_size_matches_layout() {
        let wire = encrypt(&[b"abc"], b"", StreamConfig::default());

        let data_frame = LENGTH_PREFIX_BYTES + 3 + ABYTES;
        let final_frame = LENGTH_PREFIX_BYTES + ABYTES;
        assert_eq!(wire.len(), HEADER_BYTES + data_frame + final_frame);
    }

    #[test]
    fn read_impl_yields_data_and_keeps_trailer() {
        let config = StreamConfig::default();
        let wire = encrypt(&[b"hello ", b"world"], b"end", config);

        let mut reader = StreamReader::new(wire.as_slice(), &key(), config).unwrap();
        let mut output = Vec::new();
        reader.read_to_end(&mut output).unwrap();

        assert_eq!(output, b"hello world");
        assert_eq!(reader.trailer(), Some(b"end".as_slice()));
    }

    #[test]
    fn write_impl_splits_at_chunk_limit() {
        let config = StreamConfig::default().with_max_chunk_len(4);
        let mut writer =
            StreamWriter::new(Vec::new(), &key(), &SeededEnv::with_seed(5), config).unwrap();
        writer.write_all(b"0123456789").unwrap();
        assert_eq!(writer.stream().counter(), 3);
        let wire = writer.finish(b"").unwrap();

        let mut reader = StreamReader::new(wire.as_slice(), &key(), config).unwrap();
        let mut output = Vec::new();
        reader.read_to_end(&mut output).unwrap();
        assert_eq!(output, b"0123456789");
    }

    #[test]
    fn chunk_at_exact_limit_passes_reader() {
        let config = StreamConfig::default().with_max_chunk_len(16);
        let wire = encrypt(&[&[0xA5u8; 16][..]], b"", config);

        let prefix = &wire[HEADER_BYTES..HEADER_BYTES + LENGTH_PREFIX_BYTES];
        assert_eq!(prefix, &((16 + ABYTES) as u32).to_be_bytes());

        let mut reader = StreamReader::new(wire.as_slice(), &key(), config).unwrap();
        assert_eq!(reader.read_chunk().unwrap(), Some((vec![0xA5u8; 16], Tag::Message)));
    }

    #[test]
    fn zero_chunk_limit_rejected_by_writer() {
        let config = StreamConfig::default().with_max_chunk_len(0);
        let mut sink = Vec::new();
        let err = StreamWriter::new(&mut sink, &key(), &SeededEnv::with_seed(5), config)
            .err()
            .map(|e| e.kind());

        assert_eq!(err, Some(io::ErrorKind::InvalidInput));
        assert!(sink.is_empty());
    }

    #[test]
    fn truncated_stream_is_detected() {
        let config = StreamConfig::default();
        let wire = encrypt(&[b"alpha", b"beta"], b"", config);
        let cut = &wire[..wire.len() - (LENGTH_PREFIX_BYTES + ABYTES)];

        let mut reader = StreamReader::new(cut, &key(), config).unwrap();
        let mut output = Vec::new();
        let err = reader.read_to_end(&mut output).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn oversized_length_prefix_rejected() {
        let config = StreamConfig::default().with_max_chunk_len(16);
        let mut wire = encrypt(&[b"alpha"], b"", config);
        wire[HEADER_BYTES..HEADER_BYTES + LENGTH_PREFIX_BYTES]
            .copy_from_slice(&1_000_000u32.to_be_bytes());

        let mut reader = StreamReader::new(wire.as_slice(), &key(), config).unwrap();
        let err = reader.read_chunk().unwrap_err();
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<StreamError>());

        assert_eq!(inner, Some(&StreamError::MalformedChunk { length: 1_000_000 }));
    }

    #[test]
    fn corrupted_chunk_fails_authentication() {
        let config = StreamConfig::default();
        let mut wire = encrypt(&[b"alpha"], b"", config);
        let last = wire.len() - 1;
        wire[last] ^= 0x80;

        let mut reader = StreamReader::new(wire.as_slice(), &key(), config).unwrap();
        assert!(reader.read_chunk().unwrap().is_some());

        let err = reader.read_chunk().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn short_header_rejected() {
        let err = StreamReader::new(&[0u8; 10][..], &key(), StreamConfig::default())
            .err()
            .map(|e| e.kind());
        assert_eq!(err, Some(io::ErrorKind::UnexpectedEof));
    }
}
