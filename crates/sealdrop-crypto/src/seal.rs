//! Submitter and reviewer pipelines
//!
//! Composes key exchange, derivation, hashing and the AEAD into the two
//! operations the flows actually need. Every intermediate secret is a local
//! that zeroizes when it goes out of scope, including on the error paths.

use zeroize::Zeroize;

use crate::{
    cipher::{self, NONCE_SIZE},
    derivation::derive_encryption_key,
    error::CryptoError,
    hash::{Digest, hash},
    key_exchange::{
        EphemeralKeyPair, PrivateKey, PublicKey, derive_shared_secret_with,
        generate_ephemeral_key_pair,
    },
};

/// Output of [`seal`]: everything the store needs, nothing it can read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// Ciphertext including the Poly1305 tag
    pub ciphertext: Vec<u8>,
    /// Per-message nonce
    pub nonce: [u8; NONCE_SIZE],
    /// Digest of the plaintext, bound as associated data
    pub hash: Digest,
    /// Submitter's ephemeral public key
    pub ephemeral_public_key: PublicKey,
}

/// Encrypt `plaintext` for the holder of `reviewer_public`.
///
/// A fresh ephemeral key pair is generated and dropped before returning.
pub fn seal(plaintext: &[u8], reviewer_public: &PublicKey) -> Result<SealedMessage, CryptoError> {
    let ephemeral = generate_ephemeral_key_pair()?;
    seal_with_key_pair(plaintext, reviewer_public, &ephemeral)
}

/// Like [`seal`], with a caller-supplied ephemeral key pair.
///
/// The caller is responsible for never reusing `ephemeral` across cases.
pub fn seal_with_key_pair(
    plaintext: &[u8],
    reviewer_public: &PublicKey,
    ephemeral: &EphemeralKeyPair,
) -> Result<SealedMessage, CryptoError> {
    let shared = ephemeral.diffie_hellman(reviewer_public)?;
    let key = derive_encryption_key(shared.as_bytes())?;
    let digest = hash(plaintext);

    let sealed = cipher::encrypt(plaintext, &key, Some(digest.as_bytes()))?;

    Ok(SealedMessage {
        ciphertext: sealed.ciphertext,
        nonce: sealed.nonce,
        hash: digest,
        ephemeral_public_key: *ephemeral.public_key(),
    })
}

/// Decrypt a message sealed for `reviewer_private`.
///
/// The digest is checked twice: as AEAD associated data, and against the
/// recovered plaintext. Either mismatch fails closed.
///
/// # Errors
///
/// - `InvalidKeyMaterial`: `ephemeral_public` is a low-order point
/// - `InvalidNonceLength`: nonce is not 24 bytes
/// - `AuthenticationFailed`: tampering, wrong key, or digest mismatch
pub fn open(
    reviewer_private: &PrivateKey,
    ephemeral_public: &PublicKey,
    ciphertext: &[u8],
    nonce: &[u8],
    expected_hash: &Digest,
) -> Result<Vec<u8>, CryptoError> {
    let shared = derive_shared_secret_with(reviewer_private, ephemeral_public)?;
    let key = derive_encryption_key(shared.as_bytes())?;

    let mut plaintext = cipher::decrypt(ciphertext, nonce, &key, Some(expected_hash.as_bytes()))?;

    if hash(&plaintext) != *expected_hash {
        plaintext.zeroize();
        return Err(CryptoError::AuthenticationFailed);
    }

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reviewer() -> EphemeralKeyPair {
        EphemeralKeyPair::from_secret_bytes([0x5A; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let reviewer = reviewer();
        let plaintext = b"leak at facility 4";

        let sealed = seal(plaintext, reviewer.public_key()).unwrap();
        let opened = open(
            reviewer.private_key(),
            &sealed.ephemeral_public_key,
            &sealed.ciphertext,
            &sealed.nonce,
            &sealed.hash,
        )
        .unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn sealed_hash_matches_plaintext() {
        let sealed = seal(b"report body", reviewer().public_key()).unwrap();
        assert_eq!(sealed.hash, hash(b"report body"));
    }

    #[test]
    fn each_seal_uses_a_new_ephemeral_key() {
        let reviewer = reviewer();
        let a = seal(b"same", reviewer.public_key()).unwrap();
        let b = seal(b"same", reviewer.public_key()).unwrap();
        assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_reviewer_cannot_open() {
        let sealed = seal(b"secret", reviewer().public_key()).unwrap();
        let other = EphemeralKeyPair::from_secret_bytes([0x11; 32]);

        let result = open(
            other.private_key(),
            &sealed.ephemeral_public_key,
            &sealed.ciphertext,
            &sealed.nonce,
            &sealed.hash,
        );
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn substituted_hash_fails() {
        let reviewer = reviewer();
        let sealed = seal(b"secret", reviewer.public_key()).unwrap();

        let result = open(
            reviewer.private_key(),
            &sealed.ephemeral_public_key,
            &sealed.ciphertext,
            &sealed.nonce,
            &hash(b"something else"),
        );
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn digest_not_matching_plaintext_fails() {
        // AEAD accepts the associated data, but it is not the plaintext digest
        let reviewer = reviewer();
        let ephemeral = EphemeralKeyPair::from_secret_bytes([0x77; 32]);
        let shared = ephemeral.diffie_hellman(reviewer.public_key()).unwrap();
        let key = derive_encryption_key(shared.as_bytes()).unwrap();
        let claimed = hash(b"something else");
        let sealed = cipher::encrypt_with_nonce(b"secret", &key, Some(claimed.as_bytes()), [3; 24]);

        let result = open(
            reviewer.private_key(),
            ephemeral.public_key(),
            &sealed.ciphertext,
            &sealed.nonce,
            &claimed,
        );
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn substituted_ephemeral_key_fails() {
        let reviewer = reviewer();
        let sealed = seal(b"secret", reviewer.public_key()).unwrap();
        let attacker = EphemeralKeyPair::from_secret_bytes([0x22; 32]);

        let result = open(
            reviewer.private_key(),
            attacker.public_key(),
            &sealed.ciphertext,
            &sealed.nonce,
            &sealed.hash,
        );
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn low_order_ephemeral_key_is_rejected() {
        let reviewer = reviewer();
        let sealed = seal(b"secret", reviewer.public_key()).unwrap();

        let result = open(
            reviewer.private_key(),
            &PublicKey::from_bytes([0u8; 32]),
            &sealed.ciphertext,
            &sealed.nonce,
            &sealed.hash,
        );
        assert!(matches!(result, Err(CryptoError::InvalidKeyMaterial { .. })));
    }
}
