//! Property-based tests for the primitive adapter
//!
//! 1. **Round-trip**: open(seal(tag, m)) == (tag, m) for all messages
//! 2. **Integrity**: any single-bit flip in a sealed chunk fails verification
//! 3. **Determinism**: key derivation is a pure function of its inputs
//! 4. **Rotation**: rotated subkeys cannot open chunks of the previous epoch

use proptest::prelude::*;
use sealstream_crypto::{
    ABYTES, CryptoError, NONCE_BYTES, SessionKey, derive_next_subkey, derive_stream_keys,
    open_chunk, seal_chunk,
};

fn key_strategy() -> impl Strategy<Value = [u8; 32]> {
    prop::collection::vec(any::<u8>(), 32..=32).prop_map(|v| {
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&v);
        arr
    })
}

fn nonce_strategy() -> impl Strategy<Value = [u8; NONCE_BYTES]> {
    prop::collection::vec(any::<u8>(), NONCE_BYTES..=NONCE_BYTES).prop_map(|v| {
        let mut arr = [0u8; NONCE_BYTES];
        arr.copy_from_slice(&v);
        arr
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_seal_open_roundtrip(
        key in key_strategy(),
        header in prop::collection::vec(any::<u8>(), 24..=24),
        nonce in nonce_strategy(),
        tag in any::<u8>(),
        plaintext in prop::collection::vec(any::<u8>(), 0..1000),
        aad in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let keys = derive_stream_keys(&SessionKey::from_array(key), &header);

        let sealed = seal_chunk(&keys.subkey, &nonce, tag, &plaintext, &aad);
        prop_assert_eq!(sealed.len(), plaintext.len() + ABYTES);

        let opened = open_chunk(&keys.subkey, &nonce, &sealed, &aad).unwrap();
        prop_assert_eq!(opened.tag, tag);
        prop_assert_eq!(opened.plaintext, plaintext);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_single_bit_flip_fails(
        key in key_strategy(),
        plaintext in prop::collection::vec(any::<u8>(), 0..200),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let keys = derive_stream_keys(&SessionKey::from_array(key), &[0u8; 24]);
        let nonce = [0x5A; NONCE_BYTES];

        let mut sealed = seal_chunk(&keys.subkey, &nonce, 0, &plaintext, b"");
        let index = position.index(sealed.len());
        sealed[index] ^= 1 << bit;

        prop_assert_eq!(
            open_chunk(&keys.subkey, &nonce, &sealed, b""),
            Err(CryptoError::AuthenticationFailed)
        );
    }

    #[test]
    fn prop_derivation_deterministic(
        key in key_strategy(),
        header in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let session_key = SessionKey::from_array(key);
        let keys1 = derive_stream_keys(&session_key, &header);
        let keys2 = derive_stream_keys(&session_key, &header);

        prop_assert_eq!(keys1.base_nonce.as_bytes(), keys2.base_nonce.as_bytes());

        // Subkeys are opaque; equal subkeys open each other's chunks
        let nonce = [0u8; NONCE_BYTES];
        let sealed = seal_chunk(&keys1.subkey, &nonce, 1, b"sample", b"");
        prop_assert!(open_chunk(&keys2.subkey, &nonce, &sealed, b"").is_ok());
    }

    #[test]
    fn prop_rotated_subkey_isolated(
        key in key_strategy(),
        plaintext in prop::collection::vec(any::<u8>(), 0..200),
    ) {
        let keys = derive_stream_keys(&SessionKey::from_array(key), &[9u8; 24]);
        let next = derive_next_subkey(&keys.subkey, &keys.base_nonce);
        let nonce = *keys.base_nonce.as_bytes();

        let old_epoch = seal_chunk(&keys.subkey, &nonce, 0, &plaintext, b"");
        let new_epoch = seal_chunk(&next, &nonce, 0, &plaintext, b"");

        prop_assert_eq!(open_chunk(&next, &nonce, &old_epoch, b""), Err(CryptoError::AuthenticationFailed));
        prop_assert_eq!(open_chunk(&keys.subkey, &nonce, &new_epoch, b""), Err(CryptoError::AuthenticationFailed));
    }
}
