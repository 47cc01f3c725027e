//! Ephemeral X25519 key exchange
//!
//! # Security Properties
//!
//! - Single use: a submitter generates one key pair per submission and drops
//!   it as soon as the message is sealed
//! - Zeroization: private scalars and shared secrets are wiped on drop, on
//!   every exit path
//! - Contributory check: public keys that force a known shared secret
//!   (identity or low-order points) are rejected

use std::fmt;

use x25519_dalek::{PublicKey as X25519Public, StaticSecret};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// X25519 public key size in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// X25519 private key size in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Shared secret size in bytes
pub const SHARED_SECRET_SIZE: usize = 32;

/// A 32-byte X25519 public key (Montgomery u-coordinate).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wrap raw public key bytes.
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a public key received from the transport.
    ///
    /// Only the length is checked here. Low-order points are caught when the
    /// shared secret is derived.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let Ok(bytes) = <[u8; PUBLIC_KEY_SIZE]>::try_from(bytes) else {
            return Err(CryptoError::InvalidKeyMaterial { reason: "public key must be 32 bytes" });
        };
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// A 32-byte X25519 private scalar.
///
/// Zeroized on drop. `Debug` is redacted and there is no `Display`.
#[derive(Clone)]
pub struct PrivateKey([u8; PRIVATE_KEY_SIZE]);

impl PrivateKey {
    /// Wrap raw private key bytes.
    pub const fn from_bytes(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a private key from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let Ok(bytes) = <[u8; PRIVATE_KEY_SIZE]>::try_from(bytes) else {
            return Err(CryptoError::InvalidKeyMaterial { reason: "private key must be 32 bytes" });
        };
        Ok(Self(bytes))
    }

    /// Raw scalar bytes. Callers must not persist or log these.
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.0
    }

    /// Public key corresponding to this private key.
    pub fn public_key(&self) -> PublicKey {
        let secret = StaticSecret::from(self.0);
        PublicKey(X25519Public::from(&secret).to_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// ECDH output shared by both parties.
///
/// Held only for the duration of one encryption or decryption. Zeroized on
/// drop.
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl SharedSecret {
    /// Raw secret bytes, input to [`crate::derive_encryption_key`].
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Fresh X25519 key pair for one submission or one review session.
///
/// # Invariants
///
/// - `public_key` is always derived from `private_key`
/// - Never persisted by this crate and never reused across cases
#[derive(Debug)]
pub struct EphemeralKeyPair {
    public_key: PublicKey,
    private_key: PrivateKey,
}

impl EphemeralKeyPair {
    /// Build a key pair from 32 caller-provided random bytes.
    ///
    /// Pure: the same bytes always produce the same pair. Production callers
    /// use [`generate_ephemeral_key_pair`], which sources the bytes from the
    /// OS.
    pub fn from_secret_bytes(mut secret: [u8; PRIVATE_KEY_SIZE]) -> Self {
        let private_key = PrivateKey::from_bytes(secret);
        secret.zeroize();
        let public_key = private_key.public_key();
        Self { public_key, private_key }
    }

    /// Public half, safe to transmit.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Compute the shared secret with the other party's public key.
    pub fn diffie_hellman(&self, their_public: &PublicKey) -> Result<SharedSecret, CryptoError> {
        derive_shared_secret_with(&self.private_key, their_public)
    }
}

/// Generate a fresh key pair from the OS random source.
///
/// # Errors
///
/// - `EntropyUnavailable`: the OS RNG failed. Process-fatal.
pub fn generate_ephemeral_key_pair() -> Result<EphemeralKeyPair, CryptoError> {
    let mut secret = [0u8; PRIVATE_KEY_SIZE];
    if getrandom::fill(&mut secret).is_err() {
        secret.zeroize();
        return Err(CryptoError::EntropyUnavailable);
    }

    // The array is `Copy`; wipe the local after it has been moved in
    let key_pair = EphemeralKeyPair::from_secret_bytes(secret);
    secret.zeroize();
    Ok(key_pair)
}

/// Compute the X25519 shared secret from raw key bytes.
///
/// Symmetric: `(a_priv, b_pub)` and `(b_priv, a_pub)` yield the same secret.
///
/// # Errors
///
/// - `InvalidKeyMaterial`: either key is not 32 bytes, or the public key is
///   the identity or a low-order point
pub fn derive_shared_secret(
    my_private: &[u8],
    their_public: &[u8],
) -> Result<SharedSecret, CryptoError> {
    let private_key = PrivateKey::from_slice(my_private)?;
    let public_key = PublicKey::from_slice(their_public)?;
    derive_shared_secret_with(&private_key, &public_key)
}

/// Compute the X25519 shared secret from typed keys.
pub fn derive_shared_secret_with(
    my_private: &PrivateKey,
    their_public: &PublicKey,
) -> Result<SharedSecret, CryptoError> {
    let secret = StaticSecret::from(my_private.0);
    let public = X25519Public::from(their_public.0);
    let shared = secret.diffie_hellman(&public);

    if !shared.was_contributory() {
        return Err(CryptoError::InvalidKeyMaterial {
            reason: "public key is the identity or a low-order point",
        });
    }

    Ok(SharedSecret(shared.to_bytes()))
}
