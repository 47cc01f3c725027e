//! Error types for the encryption core.
//!
//! Every variant is safe to log: they carry lengths and static reasons, never
//! plaintext, key bytes or shared secrets.

use thiserror::Error;

/// Errors from key exchange, derivation and authenticated encryption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Key has the wrong length or is not a usable curve point
    #[error("invalid key material: {reason}")]
    InvalidKeyMaterial {
        /// What was wrong with the key
        reason: &'static str,
    },

    /// Input to a fixed-width operation has the wrong length
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidInputLength {
        /// Required length in bytes
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Nonce is not exactly [`crate::NONCE_SIZE`] bytes
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Required length in bytes
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Ciphertext, nonce or associated data was tampered with, or the key is
    /// wrong. No plaintext is released.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The OS random source failed
    #[error("entropy unavailable")]
    EntropyUnavailable,
}

impl CryptoError {
    /// Returns true if the process cannot continue operating securely.
    ///
    /// Only entropy failure is process-fatal. Every other error is fatal to
    /// the single operation or message it came from, and none of them are
    /// worth retrying with the same inputs.
    pub fn is_process_fatal(&self) -> bool {
        match self {
            Self::EntropyUnavailable => true,

            Self::InvalidKeyMaterial { .. }
            | Self::InvalidInputLength { .. }
            | Self::InvalidNonceLength { .. }
            | Self::AuthenticationFailed => false,
        }
    }
}
