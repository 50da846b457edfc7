//! Fuzz target for the framed stream reader
//!
//! Feeds arbitrary bytes to `StreamReader` as if they were a sealed stream.
//!
//! # Invariants
//!
//! - Reading never panics; invalid input returns an error
//! - A forged stream never reaches the final chunk without the key
//! - Oversized length prefixes are rejected before allocation

#![no_main]

use std::io::Read;

use libfuzzer_sys::fuzz_target;
use sealstream_core::{SessionKey, StreamConfig, StreamReader};

fuzz_target!(|data: &[u8]| {
    let key = SessionKey::from_array([0u8; 32]);
    let config = StreamConfig::default().with_max_chunk_len(64 * 1024);

    let Ok(mut reader) = StreamReader::new(data, &key, config) else {
        return;
    };

    let mut sink = Vec::new();
    if reader.read_to_end(&mut sink).is_ok() {
        // INVARIANT: only authentic streams end cleanly
        assert!(reader.is_finished(), "clean EOF without a verified final chunk");
    }
});
