//! Reviewer role: open envelopes with the private key and audit a case log.
//!
//! Every envelope from the store is hostile until it authenticates. A bad
//! envelope is recorded against its `seq` and the rest of the case is still
//! opened.

use sealdrop_crypto::{PrivateKey, PublicKey, open};
use sealdrop_proto::{CaseId, Envelope, ProtocolError, ReportPayload, SequenceReport, check_sequence};
use sealdrop_store::Storage;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::{error::ClientError, key_store::ReviewerKeyStore};

/// One envelope's outcome within a case review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedReport {
    /// Store-assigned sequence number
    pub seq: u64,
    /// Unix seconds at which the store accepted the envelope
    pub created_at: u64,
    /// Decrypted report, or why it could not be opened
    pub result: Result<ReportPayload, ClientError>,
}

/// Everything the reviewer learned from one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReview {
    /// Case that was reviewed
    pub case_id: CaseId,
    /// Per-envelope outcomes in `seq` order
    pub reports: Vec<OpenedReport>,
    /// Continuity of the case log as returned by the store
    pub sequence: SequenceReport,
}

impl CaseReview {
    /// Successfully opened reports.
    pub fn opened(&self) -> impl Iterator<Item = (u64, &ReportPayload)> {
        self.reports.iter().filter_map(|r| r.result.as_ref().ok().map(|p| (r.seq, p)))
    }

    /// Number of envelopes that failed to open.
    pub fn failure_count(&self) -> usize {
        self.reports.iter().filter(|r| r.result.is_err()).count()
    }

    /// Every envelope opened and the log has no gaps or duplicates.
    pub fn is_intact(&self) -> bool {
        self.failure_count() == 0 && self.sequence.is_clean()
    }
}

/// Holder of the reviewer private key.
pub struct Reviewer {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl Reviewer {
    /// Reviewer using the given private key.
    pub fn new(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self { private_key, public_key }
    }

    /// Load the private key from a key store.
    ///
    /// # Errors
    ///
    /// `KeyStore` if the key cannot be loaded.
    pub fn from_key_store(store: &impl ReviewerKeyStore) -> Result<Self, ClientError> {
        Ok(Self::new(store.load_private_key()?))
    }

    /// Public key submitters seal to.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Authenticate, decrypt and parse one envelope.
    ///
    /// # Errors
    ///
    /// - `Decryption`: low-order ephemeral key, failed tag, or digest mismatch
    /// - `Payload`: plaintext authenticated but is not a valid report
    pub fn open_envelope(&self, envelope: &Envelope) -> Result<ReportPayload, ClientError> {
        let plaintext = Zeroizing::new(
            open(
                &self.private_key,
                envelope.ephemeral_public_key(),
                envelope.ciphertext(),
                envelope.nonce(),
                envelope.hash(),
            )
            .map_err(ClientError::Decryption)?,
        );

        ReportPayload::from_bytes(&plaintext).map_err(ClientError::Payload)
    }

    /// Open every envelope of a case and check the log for continuity.
    ///
    /// # Errors
    ///
    /// `Storage` only if the case cannot be loaded at all. Per-envelope
    /// failures land in [`CaseReview::reports`].
    pub fn review_case<S: Storage>(
        &self,
        storage: &S,
        case_id: &CaseId,
    ) -> Result<CaseReview, ClientError> {
        let mut envelopes = storage.load_messages(case_id)?;
        envelopes.sort_by_key(Envelope::seq);

        let sequence = check_sequence(&envelopes);
        if !sequence.is_clean() {
            warn!(
                case_id = %case_id,
                gaps = sequence.gaps.len(),
                duplicates = sequence.duplicates.len(),
                "case log is not contiguous"
            );
        }

        let reports: Vec<OpenedReport> = envelopes
            .iter()
            .map(|envelope| {
                let result = if envelope.case_id() == case_id {
                    self.open_envelope(envelope)
                } else {
                    Err(ClientError::Envelope(ProtocolError::InvalidField {
                        field: "case_id",
                        reason: format!("envelope belongs to {}", envelope.case_id()),
                    }))
                };

                match &result {
                    Ok(payload) => debug!(
                        case_id = %case_id,
                        seq = envelope.seq(),
                        attachments = payload.files.len(),
                        "envelope opened"
                    ),
                    Err(err) => warn!(case_id = %case_id, seq = envelope.seq(), error = %err, "envelope rejected"),
                }

                OpenedReport { seq: envelope.seq(), created_at: envelope.created_at(), result }
            })
            .collect();

        let review = CaseReview { case_id: case_id.clone(), reports, sequence };
        info!(
            case_id = %case_id,
            envelopes = review.reports.len(),
            failed = review.failure_count(),
            "case reviewed"
        );
        Ok(review)
    }
}

impl std::fmt::Debug for Reviewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reviewer").field("public_key", &self.public_key).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use sealdrop_crypto::{CryptoError, seal};
    use sealdrop_proto::SubmitRequest;
    use sealdrop_store::{ManualEnv, MemoryStorage};

    use super::*;
    use crate::submitter::Submitter;

    fn reviewer() -> Reviewer {
        Reviewer::new(PrivateKey::from_bytes([0x33; 32]))
    }

    #[test]
    fn opens_submitted_report() {
        let reviewer = reviewer();
        let storage = MemoryStorage::new(ManualEnv::new(5, 2));
        let case_id = storage.create_case().unwrap().case_id;

        let payload = ReportPayload::new("leak at facility 4").with_attachment("a.txt", b"hi".to_vec());
        let envelope =
            Submitter::new(*reviewer.public_key()).submit(&storage, &case_id, &payload).unwrap();

        assert_eq!(reviewer.open_envelope(&envelope).unwrap(), payload);
    }

    #[test]
    fn wrong_reviewer_cannot_open() {
        let storage = MemoryStorage::new(ManualEnv::new(5, 2));
        let case_id = storage.create_case().unwrap().case_id;
        let envelope = Submitter::new(*reviewer().public_key())
            .submit(&storage, &case_id, &ReportPayload::new("x"))
            .unwrap();

        let other = Reviewer::new(PrivateKey::from_bytes([0x44; 32]));
        assert_eq!(
            other.open_envelope(&envelope),
            Err(ClientError::Decryption(CryptoError::AuthenticationFailed))
        );
    }

    #[test]
    fn authenticated_garbage_is_payload_error() {
        let reviewer = reviewer();
        let storage = MemoryStorage::new(ManualEnv::new(5, 2));
        let case_id = storage.create_case().unwrap().case_id;

        let sealed = seal(b"plain text, not a report payload", reviewer.public_key()).unwrap();
        let envelope =
            storage.append_message(SubmitRequest::new(case_id, sealed).unwrap()).unwrap();

        assert!(matches!(reviewer.open_envelope(&envelope), Err(ClientError::Payload(_))));
    }

    #[test]
    fn review_reports_every_envelope() {
        let reviewer = reviewer();
        let storage = MemoryStorage::new(ManualEnv::new(5, 2));
        let case_id = storage.create_case().unwrap().case_id;
        let submitter = Submitter::new(*reviewer.public_key());

        for text in ["first", "second", "third"] {
            submitter.submit(&storage, &case_id, &ReportPayload::new(text)).unwrap();
        }

        let review = reviewer.review_case(&storage, &case_id).unwrap();
        let texts: Vec<&str> = review.opened().map(|(_, p)| p.report.as_str()).collect();

        assert_eq!(texts, vec!["first", "second", "third"]);
        assert!(review.is_intact());
    }

    #[test]
    fn debug_hides_private_key() {
        let rendered = format!("{:?}", reviewer());
        assert!(rendered.contains("public_key"));
        assert!(!rendered.contains("private_key"));
    }
}
