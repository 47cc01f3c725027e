//! Storage errors.

use sealdrop_proto::{CaseId, ProtocolError};
use thiserror::Error;

/// Errors from the case store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No case with this id exists
    #[error("case not found: {0}")]
    CaseNotFound(CaseId),

    /// Case exists but no longer accepts messages
    #[error("case expired: {case_id} (expired at {expires_at})")]
    CaseExpired {
        /// Case that was targeted
        case_id: CaseId,
        /// Unix seconds at which the case closed
        expires_at: u64,
    },

    /// Ciphertext exceeds the store's configured limit
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual size in bytes
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// A stored or generated unit failed protocol validation
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The case log has used every sequence number
    #[error("sequence numbers exhausted for case {0}")]
    SequenceExhausted(CaseId),

    /// Backend could not be reached or failed mid-operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether repeating the same call later could succeed.
    ///
    /// Only backend outages qualify. Every other variant describes the
    /// request or the case and will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
