//! Integrity digests using SHA-256
//!
//! The digest of a report's plaintext is bound into the AEAD as associated
//! data and travels next to the ciphertext so a reviewer can recheck it after
//! decryption. Not suitable for passwords or other low-entropy inputs.

use std::fmt;

use sha2::{Digest as _, Sha256};

use crate::error::CryptoError;

/// Digest size in bytes (SHA-256)
pub const DIGEST_SIZE: usize = 32;

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a digest received from the transport.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let Ok(bytes) = <[u8; DIGEST_SIZE]>::try_from(bytes) else {
            return Err(CryptoError::InvalidInputLength {
                expected: DIGEST_SIZE,
                actual: bytes.len(),
            });
        };
        Ok(Self(bytes))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

/// Hash arbitrary bytes with SHA-256.
///
/// Deterministic: the same input always yields the same digest.
pub fn hash(input: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(input);
    Digest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash(b"leak at facility 4"), hash(b"leak at facility 4"));
    }

    #[test]
    fn different_inputs_produce_different_digests() {
        assert_ne!(hash(b"leak at facility 4"), hash(b"leak at facility 5"));
    }

    #[test]
    fn empty_input_matches_known_vector() {
        assert_eq!(
            hash(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn abc_matches_known_vector() {
        assert_eq!(
            hash(b"abc").to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let result = Digest::from_slice(&[0u8; 31]);
        assert_eq!(result, Err(CryptoError::InvalidInputLength { expected: 32, actual: 31 }));
    }

    #[test]
    fn from_slice_roundtrips_bytes() {
        let digest = hash(b"report");
        let parsed = Digest::from_slice(digest.as_bytes()).unwrap();
        assert_eq!(parsed, digest);
    }
}
