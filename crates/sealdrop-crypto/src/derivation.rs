//! Symmetric key derivation from the ECDH shared secret

use std::fmt;

use sha2::{Digest as _, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::{error::CryptoError, key_exchange::SHARED_SECRET_SIZE};

/// Domain separation tag, versioned with the wire protocol
///
/// Exactly 32 bytes so that tag and secret fill one SHA-256 block.
pub const KEY_DERIVATION_TAG: &[u8; 32] = b"sealdrop-xchacha20poly1305-kdfv1";

/// SHA-256 block size in bytes
const HASH_BLOCK_SIZE: usize = 64;

/// Symmetric key size in bytes (XChaCha20-Poly1305)
pub const KEY_SIZE: usize = 32;

/// A 32-byte symmetric key for the AEAD.
///
/// Zeroized on drop.
#[derive(Clone)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Wrap raw key bytes.
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a key from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let Ok(bytes) = <[u8; KEY_SIZE]>::try_from(bytes) else {
            return Err(CryptoError::InvalidKeyMaterial { reason: "encryption key must be 32 bytes" });
        };
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Derive the AEAD key from a shared secret.
///
/// `SHA-256(KEY_DERIVATION_TAG || shared_secret)`. The digest width equals
/// the cipher key width.
///
/// # Security
///
/// - Deterministic: same secret always yields the same key
/// - The tag keeps this key distinct from keys derived from the same secret
///   for any other purpose or protocol version
///
/// # Errors
///
/// - `InvalidInputLength`: `shared_secret` is not exactly 32 bytes
pub fn derive_encryption_key(shared_secret: &[u8]) -> Result<EncryptionKey, CryptoError> {
    if shared_secret.len() != SHARED_SECRET_SIZE {
        return Err(CryptoError::InvalidInputLength {
            expected: SHARED_SECRET_SIZE,
            actual: shared_secret.len(),
        });
    }

    // One full-block update is compressed straight from `input`, so the
    // hasher never keeps a copy of the secret in its partial-block buffer.
    let mut input = Zeroizing::new([0u8; HASH_BLOCK_SIZE]);
    input[..KEY_DERIVATION_TAG.len()].copy_from_slice(KEY_DERIVATION_TAG);
    input[KEY_DERIVATION_TAG.len()..].copy_from_slice(shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(input.as_slice());

    let mut key: [u8; KEY_SIZE] = hasher.finalize().into();
    let derived = EncryptionKey(key);
    key.zeroize();

    Ok(derived)
}
