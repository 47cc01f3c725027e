//! Fuzz target for the seal/open chain
//!
//! Seals arbitrary plaintext to a fuzzer-chosen reviewer key, then applies a
//! fuzzer-chosen mutation to one transported field before opening.
//!
//! # Invariants
//!
//! - Unmodified envelopes ALWAYS open to the original plaintext
//! - Any modified ciphertext, nonce or digest fails with
//!   `AuthenticationFailed`; no bytes are released
//! - Arbitrary ephemeral public keys never panic and never release bytes
//!   other than the original plaintext

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealdrop_crypto::{CryptoError, Digest, EphemeralKeyPair, PublicKey, open, seal_with_key_pair};

#[derive(Debug, Arbitrary)]
struct Scenario {
    reviewer_secret: [u8; 32],
    submitter_secret: [u8; 32],
    plaintext: Vec<u8>,
    mutation: Mutation,
}

#[derive(Debug, Arbitrary)]
enum Mutation {
    None,
    Ciphertext { index: u16, mask: u8 },
    Nonce { index: u8, mask: u8 },
    Hash { index: u8, mask: u8 },
    EphemeralKey([u8; 32]),
}

fuzz_target!(|scenario: Scenario| {
    let reviewer = EphemeralKeyPair::from_secret_bytes(scenario.reviewer_secret);
    let submitter = EphemeralKeyPair::from_secret_bytes(scenario.submitter_secret);

    let Ok(sealed) = seal_with_key_pair(&scenario.plaintext, reviewer.public_key(), &submitter) else {
        return;
    };

    let mut ciphertext = sealed.ciphertext.clone();
    let mut nonce = sealed.nonce;
    let mut hash = *sealed.hash.as_bytes();
    let mut ephemeral = sealed.ephemeral_public_key;

    let tampered = match scenario.mutation {
        Mutation::None => false,
        Mutation::Ciphertext { mask: 0, .. }
        | Mutation::Nonce { mask: 0, .. }
        | Mutation::Hash { mask: 0, .. } => false,
        Mutation::Ciphertext { index, mask } => {
            let i = usize::from(index) % ciphertext.len();
            ciphertext[i] ^= mask;
            true
        },
        Mutation::Nonce { index, mask } => {
            nonce[usize::from(index) % nonce.len()] ^= mask;
            true
        },
        Mutation::Hash { index, mask } => {
            hash[usize::from(index) % hash.len()] ^= mask;
            true
        },
        Mutation::EphemeralKey(bytes) => {
            ephemeral = PublicKey::from_bytes(bytes);
            true
        },
    };

    let result = open(reviewer.private_key(), &ephemeral, &ciphertext, &nonce, &Digest::from_bytes(hash));

    if matches!(scenario.mutation, Mutation::EphemeralKey(_)) {
        // Encodings that differ only in the masked high bit name the same
        // point, so a swapped key may still open; it must never yield
        // different bytes
        if let Ok(opened) = result {
            assert_eq!(opened, scenario.plaintext);
        }
    } else if tampered {
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    } else {
        assert_eq!(result.expect("untouched envelope must open"), scenario.plaintext);
    }
});
