//! Sealdrop Cryptographic Core
//!
//! End-to-end encryption between an anonymous submitter and a reviewer,
//! through a store that is assumed hostile. Pure functions apart from OS
//! randomness for keys and nonces; every secret zeroizes on drop.
//!
//! # Key Lifecycle
//!
//! ```text
//! Submitter ephemeral key ──┐        ┌── Reviewer private key
//!                           ▼        ▼
//!                      X25519 Diffie-Hellman
//!                              │
//!                              ▼
//!       SHA-256("sealdrop-xchacha20poly1305-kdfv1" || secret)
//!                              │
//!                              ▼
//!       XChaCha20-Poly1305 (AAD = SHA-256(plaintext)) → Ciphertext
//! ```
//!
//! The submitter's key pair lives for exactly one [`seal`] call. The reviewer
//! reruns the exchange with its own private key and the ephemeral public key
//! carried next to the ciphertext.
//!
//! # Security
//!
//! Confidentiality:
//! - The store only ever sees ciphertext, nonce, digest and ephemeral public
//!   key
//!
//! Authenticity:
//! - Poly1305 tag covers ciphertext and the plaintext digest
//! - Failed tag -> `AuthenticationFailed`, no bytes released
//!
//! Hygiene:
//! - Low-order public keys are rejected
//! - Errors carry lengths and static reasons only

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cipher;
pub mod derivation;
pub mod error;
pub mod hash;
pub mod key_exchange;
pub mod seal;

pub use cipher::{NONCE_SIZE, Sealed, TAG_SIZE, decrypt, encrypt, encrypt_with_nonce};
pub use derivation::{EncryptionKey, KEY_DERIVATION_TAG, KEY_SIZE, derive_encryption_key};
pub use error::CryptoError;
pub use hash::{DIGEST_SIZE, Digest, hash};
pub use key_exchange::{
    EphemeralKeyPair, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, PrivateKey, PublicKey, SHARED_SECRET_SIZE,
    SharedSecret, derive_shared_secret, derive_shared_secret_with, generate_ephemeral_key_pair,
};
pub use seal::{SealedMessage, open, seal, seal_with_key_pair};
