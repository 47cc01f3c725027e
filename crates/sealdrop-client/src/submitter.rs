//! Submitter role: seal a report for the reviewer and hand it to the store.

use sealdrop_crypto::{PublicKey, seal};
use sealdrop_proto::{CaseId, Envelope, ReportPayload, SubmitRequest};
use sealdrop_store::Storage;
use tracing::info;
use zeroize::Zeroizing;

use crate::error::ClientError;

/// Seals reports to one reviewer public key.
///
/// Holds no secrets. Each seal generates and discards its own ephemeral key
/// pair, so two submissions from the same submitter share nothing linkable.
#[derive(Debug, Clone, Copy)]
pub struct Submitter {
    reviewer_public: PublicKey,
}

impl Submitter {
    /// Submitter addressing the given reviewer.
    pub fn new(reviewer_public: PublicKey) -> Self {
        Self { reviewer_public }
    }

    /// Reviewer key reports are sealed to.
    pub fn reviewer_public(&self) -> &PublicKey {
        &self.reviewer_public
    }

    /// Encode and seal a report without sending it.
    ///
    /// # Errors
    ///
    /// - `Payload`: report fails validation
    /// - `Sealing`: OS randomness unavailable
    /// - `Envelope`: sealed report exceeds the protocol size limit
    pub fn seal_report(
        &self,
        case_id: &CaseId,
        payload: &ReportPayload,
    ) -> Result<SubmitRequest, ClientError> {
        let plaintext = Zeroizing::new(payload.to_bytes().map_err(ClientError::Payload)?);
        let sealed = seal(&plaintext, &self.reviewer_public).map_err(ClientError::Sealing)?;
        SubmitRequest::new(case_id.clone(), sealed).map_err(ClientError::Envelope)
    }

    /// Seal a report and append it to its case.
    ///
    /// # Errors
    ///
    /// As [`Self::seal_report`], plus `Storage` when the store rejects the
    /// append. Nothing is retried here; check
    /// [`ClientError::is_retryable`].
    pub fn submit<S: Storage>(
        &self,
        storage: &S,
        case_id: &CaseId,
        payload: &ReportPayload,
    ) -> Result<Envelope, ClientError> {
        let request = self.seal_report(case_id, payload)?;
        let size = request.ciphertext_len();
        let envelope = storage.append_message(request)?;

        info!(case_id = %case_id, seq = envelope.seq(), size, "report submitted");
        Ok(envelope)
    }
}
