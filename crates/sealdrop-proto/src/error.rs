//! Codec errors.
//!
//! A codec error is fatal to the one envelope or payload it came from. Batch
//! decoders report it per item and keep going.

use thiserror::Error;

/// Result alias for codec operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from encoding or decoding transport units.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Required field missing, wrong JSON type, or binary field not valid
    /// base64 of the right width
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong
        reason: String,
    },

    /// Envelope declares a protocol version this build does not speak
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u64),

    /// Ciphertext exceeds the maximum message size
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual size in bytes
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// A field failed validation while encoding
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name as it appears on the wire
        field: &'static str,
        /// What was wrong
        reason: String,
    },

    /// Decrypted bytes are not a well-formed report payload
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// What was wrong
        reason: String,
    },
}

impl ProtocolError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope { reason: reason.into() }
    }

    pub(crate) fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload { reason: reason.into() }
    }

    /// Re-tag encode-side validation failures as transport corruption.
    ///
    /// Used on the decode path, where a bad field means the bytes on the wire
    /// were not produced by a conforming encoder.
    pub(crate) fn into_malformed(self) -> Self {
        match self {
            Self::InvalidField { field, reason } => {
                Self::MalformedEnvelope { reason: format!("{field}: {reason}") }
            },
            other => other,
        }
    }
}
