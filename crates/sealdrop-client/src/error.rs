//! Client errors.
//!
//! The split that matters to callers is retry: a storage outage may clear up,
//! a failed decryption never will.

use sealdrop_crypto::CryptoError;
use sealdrop_proto::ProtocolError;
use sealdrop_store::StorageError;
use thiserror::Error;

/// Errors loading or creating a reviewer key file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyStoreError {
    /// File could not be read or written
    #[error("key file {path}: {message}")]
    Io {
        /// Key file path
        path: String,
        /// Underlying I/O error text
        message: String,
    },

    /// Refused to overwrite an existing key file
    #[error("key file {path} already exists")]
    AlreadyExists {
        /// Key file path
        path: String,
    },

    /// Group or others can read the key file
    #[error("key file {path} has insecure permissions {mode:o}; expected 600")]
    InsecurePermissions {
        /// Key file path
        path: String,
        /// Permission bits found
        mode: u32,
    },

    /// Content is not a hex-encoded 32-byte key
    #[error("key file {path} is malformed: {reason}")]
    Malformed {
        /// Key file path
        path: String,
        /// What was wrong
        reason: &'static str,
    },

    /// Key generation failed
    #[error("key generation failed: {0}")]
    Generation(CryptoError),
}

/// Errors from submitter and reviewer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Store rejected the call or could not be reached
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Envelope failed authentication or key agreement
    #[error("decryption failed: {0}")]
    Decryption(CryptoError),

    /// Sealing failed before anything was sent
    #[error("sealing failed: {0}")]
    Sealing(CryptoError),

    /// Envelope or request shape is wrong, or belongs to another case
    #[error("envelope: {0}")]
    Envelope(ProtocolError),

    /// Decrypted bytes are not a valid report, or the report cannot be encoded
    #[error("payload: {0}")]
    Payload(ProtocolError),

    /// Reviewer key could not be loaded
    #[error("key store: {0}")]
    KeyStore(#[from] KeyStoreError),
}

impl ClientError {
    /// Whether repeating the call later could succeed.
    ///
    /// Only storage outages qualify. Cryptographic and format failures are
    /// properties of the bytes and will fail identically every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_transient(),
            Self::Decryption(_)
            | Self::Sealing(_)
            | Self::Envelope(_)
            | Self::Payload(_)
            | Self::KeyStore(_) => false,
        }
    }
}
