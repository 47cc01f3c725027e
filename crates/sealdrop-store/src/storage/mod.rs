//! Storage abstraction for Sealdrop cases
//!
//! The store is untrusted: it sees only ciphertext and metadata. Its one job
//! that matters for integrity is assigning sequence numbers, so reviewers can
//! detect withheld or replayed messages. The trait is synchronous.

mod chaotic;
mod memory;

pub use chaotic::ChaoticStorage;
pub use memory::MemoryStorage;
use sealdrop_proto::{CaseId, Envelope, SubmitRequest};

use crate::error::StorageError;

/// Metadata for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCase {
    /// Case identifier
    pub case_id: CaseId,
    /// Unix seconds when the case was opened
    pub created_at: u64,
    /// Unix seconds after which appends are rejected
    pub expires_at: u64,
    /// Number of messages in the case log
    pub message_count: u64,
}

impl StoredCase {
    /// Whether the case is closed at `now`.
    ///
    /// A case expiring exactly at `now` is still open.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at < now
    }
}

/// Storage abstraction for cases and their message logs
///
/// Must be Clone (handed to submitters and reviewers alike), Send + Sync, and
/// synchronous. Implementations share internal state, so clones see the same
/// cases.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Open a new case with a fresh random id.
    fn create_case(&self) -> Result<StoredCase, StorageError>;

    /// Case metadata, or `None` if the id is unknown.
    fn load_case(&self, case_id: &CaseId) -> Result<Option<StoredCase>, StorageError>;

    /// All case ids. Order is not guaranteed.
    fn list_cases(&self) -> Result<Vec<CaseId>, StorageError>;

    /// Append a message to its case and return the stored envelope.
    ///
    /// # Invariants
    ///
    /// - Post: the returned `seq` equals the number of messages the case held
    ///   before this call. Concurrent appends to one case never share a `seq`.
    ///
    /// # Errors
    ///
    /// - `CaseNotFound`: unknown case
    /// - `CaseExpired`: `expires_at < now`
    /// - `PayloadTooLarge`: ciphertext over the configured maximum
    fn append_message(&self, request: SubmitRequest) -> Result<Envelope, StorageError>;

    /// Every envelope of a case in `seq` order.
    ///
    /// Expired cases stay readable.
    fn load_messages(&self, case_id: &CaseId) -> Result<Vec<Envelope>, StorageError>;
}
