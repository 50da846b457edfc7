//! Fuzz target for the stream state machine
//!
//! Drives a sender/receiver pair through arbitrary push, pull, tamper, drop
//! and rekey sequences.
//!
//! # Strategy
//!
//! - Arbitrary tags, payloads and associated data
//! - Tiny rekey intervals to exercise forced rotation
//! - Bit flips, drops and replays between sender and receiver
//! - Operations after finalization
//!
//! # Invariants
//!
//! - Authentic in-order chunks always open to the pushed plaintext and tag
//! - Tampered, dropped-ahead or replayed chunks fail and leave state unchanged
//! - Sender and receiver counters and epochs stay in step
//! - After `Final`, push, pull and rekey return `InvalidPhase`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealstream_core::{
    SeededEnv, SessionKey, StreamConfig, StreamError, Tag, initialize_receiver,
    initialize_sender,
};

#[derive(Debug, Clone, Arbitrary)]
struct StreamScenario {
    key: [u8; 32],
    seed: u64,
    /// Rekey interval, small values force frequent rotation
    rekey_interval: u8,
    operations: Vec<StreamOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum StreamOperation {
    /// Push and deliver a chunk
    Deliver { payload: Vec<u8>, tag: u8, aad: Option<Vec<u8>> },
    /// Push a chunk, flip one bit, then deliver the original
    Tamper { payload: Vec<u8>, position: u16, bit: u8 },
    /// Deliver a chunk with mismatched associated data, then the right one
    WrongAad { payload: Vec<u8>, aad: Vec<u8> },
    /// Deliver the previous chunk again
    Replay,
    /// Explicit rekey on both sides
    Rekey,
}

fn tag_from(raw: u8) -> Tag {
    match raw % 4 {
        0 => Tag::Message,
        1 => Tag::Push,
        2 => Tag::Rekey,
        _ => Tag::Final,
    }
}

fuzz_target!(|scenario: StreamScenario| {
    let key = SessionKey::from_array(scenario.key);
    let config = StreamConfig::default()
        .with_rekey_interval(u32::from(scenario.rekey_interval))
        .with_max_chunk_len(4096);

    let env = SeededEnv::with_seed(scenario.seed);
    let Ok((header, mut sender)) = initialize_sender(&key, &env, config) else {
        return;
    };
    let Ok(mut receiver) = initialize_receiver(&key, header.as_bytes(), config) else {
        return;
    };

    let mut previous = None;

    for op in scenario.operations {
        if sender.is_finalized() {
            // INVARIANT: finalization is terminal on both sides
            assert!(matches!(
                sender.push(b"late", Tag::Message, None),
                Err(StreamError::InvalidPhase { .. })
            ));
            assert!(matches!(sender.rekey(), Err(StreamError::InvalidPhase { .. })));
            if let Some(chunk) = &previous {
                assert!(matches!(
                    receiver.pull(chunk, None),
                    Err(StreamError::InvalidPhase { .. })
                ));
            }
            return;
        }

        match op {
            StreamOperation::Deliver { payload, tag, aad } => {
                let tag = tag_from(tag);
                let aad = aad.as_deref();
                let Ok(chunk) = sender.push(&payload, tag, aad) else {
                    assert!(payload.len() > 4096, "push fails only on oversized payloads");
                    continue;
                };

                // INVARIANT: authentic chunk opens to what was pushed
                let opened = receiver.pull(&chunk, aad);
                assert_eq!(opened, Ok((payload, tag)));
                previous = Some(chunk);
            },

            StreamOperation::Tamper { payload, position, bit } => {
                let Ok(chunk) = sender.push(&payload, Tag::Message, None) else {
                    continue;
                };

                let mut tampered = chunk.as_bytes().to_vec();
                let index = usize::from(position) % tampered.len();
                tampered[index] ^= 1 << (bit % 8);

                let (counter, epoch) = (receiver.counter(), receiver.epoch());

                // INVARIANT: tampering is detected and leaves state unchanged
                assert_eq!(receiver.pull(&tampered, None), Err(StreamError::AuthenticationFailed));
                assert_eq!((receiver.counter(), receiver.epoch()), (counter, epoch));

                assert_eq!(receiver.pull(&chunk, None), Ok((payload, Tag::Message)));
                previous = Some(chunk);
            },

            StreamOperation::WrongAad { payload, aad } => {
                let Ok(chunk) = sender.push(&payload, Tag::Message, Some(aad.as_slice())) else {
                    continue;
                };

                let mut wrong = aad.clone();
                wrong.push(0);
                assert_eq!(
                    receiver.pull(&chunk, Some(wrong.as_slice())),
                    Err(StreamError::AuthenticationFailed)
                );
                assert_eq!(receiver.pull(&chunk, Some(aad.as_slice())), Ok((payload, Tag::Message)));
                previous = Some(chunk);
            },

            StreamOperation::Replay => {
                if let Some(chunk) = &previous {
                    // INVARIANT: a chunk never opens at a second position
                    assert_eq!(receiver.pull(chunk, None), Err(StreamError::AuthenticationFailed));
                }
            },

            StreamOperation::Rekey => {
                assert!(sender.rekey().is_ok());
                assert!(receiver.rekey().is_ok());
            },
        }

        // INVARIANT: both sides agree on their position
        assert_eq!(sender.counter(), receiver.counter());
        assert_eq!(sender.epoch(), receiver.epoch());
        assert_eq!(sender.is_finalized(), receiver.is_finalized());
    }
});
