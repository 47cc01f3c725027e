//! End-to-end flow through a hostile store
//!
//! Reviewer key on disk, submitter seals several reports, the store tampers
//! with what it hands back. The reviewer must open everything authentic,
//! reject the tampered envelope and notice the withheld one.

use sealdrop_client::{
    ClientError, FileKeyStore, Reviewer, Submitter, generate_reviewer_key,
};
use sealdrop_crypto::CryptoError;
use sealdrop_proto::{CaseId, Envelope, ReportPayload, SubmitRequest};
use sealdrop_store::{
    ChaoticStorage, ManualEnv, MemoryStorage, Storage, StorageError, StoredCase,
};
use serde_json::Value;

/// Store that corrupts one envelope and withholds another on read.
#[derive(Clone)]
struct TamperingStorage<S: Storage> {
    inner: S,
    corrupt_seq: u64,
    withhold_seq: u64,
}

impl<S: Storage> Storage for TamperingStorage<S> {
    fn create_case(&self) -> Result<StoredCase, StorageError> {
        self.inner.create_case()
    }

    fn load_case(&self, case_id: &CaseId) -> Result<Option<StoredCase>, StorageError> {
        self.inner.load_case(case_id)
    }

    fn list_cases(&self) -> Result<Vec<CaseId>, StorageError> {
        self.inner.list_cases()
    }

    fn append_message(&self, request: SubmitRequest) -> Result<Envelope, StorageError> {
        self.inner.append_message(request)
    }

    fn load_messages(&self, case_id: &CaseId) -> Result<Vec<Envelope>, StorageError> {
        let envelopes = self.inner.load_messages(case_id)?;
        Ok(envelopes
            .into_iter()
            .filter(|e| e.seq() != self.withhold_seq)
            .map(|e| if e.seq() == self.corrupt_seq { flip_ciphertext_byte(&e) } else { e })
            .collect())
    }
}

fn flip_ciphertext_byte(envelope: &Envelope) -> Envelope {
    let mut ciphertext = envelope.ciphertext().to_vec();
    ciphertext[0] ^= 0x01;

    Envelope::encode(
        envelope.case_id().as_str(),
        &ciphertext,
        envelope.nonce(),
        envelope.hash().as_bytes(),
        envelope.ephemeral_public_key().as_bytes(),
        envelope.seq(),
        envelope.created_at(),
    )
    .unwrap()
}

#[test]
fn reviewer_survives_hostile_store() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("reviewer.key");
    let reviewer_public = generate_reviewer_key(&key_path).unwrap();

    let storage = TamperingStorage {
        inner: MemoryStorage::new(ManualEnv::new(1_700_000_000, 13)),
        corrupt_seq: 1,
        withhold_seq: 3,
    };
    let case_id = storage.create_case().unwrap().case_id;

    let submitter = Submitter::new(reviewer_public);
    for i in 0..5 {
        let payload = ReportPayload::new(format!("report {i}"))
            .with_attachment(format!("evidence-{i}.bin"), vec![i; 32]);
        submitter.submit(&storage, &case_id, &payload).unwrap();
    }

    let reviewer = Reviewer::from_key_store(&FileKeyStore::new(&key_path)).unwrap();
    assert_eq!(reviewer.public_key(), &reviewer_public);

    let review = reviewer.review_case(&storage, &case_id).unwrap();

    let seqs: Vec<u64> = review.reports.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 4]);

    assert_eq!(
        review.reports[1].result,
        Err(ClientError::Decryption(CryptoError::AuthenticationFailed))
    );

    let opened: Vec<(u64, String)> =
        review.opened().map(|(seq, p)| (seq, p.report.clone())).collect();
    assert_eq!(
        opened,
        vec![(0, "report 0".to_string()), (2, "report 2".to_string()), (4, "report 4".to_string())]
    );

    assert_eq!(review.sequence.gaps, vec![3..=3]);
    assert!(!review.is_intact());
    assert_eq!(review.failure_count(), 1);
}

#[test]
fn envelopes_survive_json_transport() {
    let reviewer = Reviewer::new(sealdrop_crypto::PrivateKey::from_bytes([0x55; 32]));
    let storage = MemoryStorage::new(ManualEnv::new(0, 1));
    let case_id = storage.create_case().unwrap().case_id;

    let submitter = Submitter::new(*reviewer.public_key());
    let request = submitter.seal_report(&case_id, &ReportPayload::new("over the wire")).unwrap();

    // Submitter -> store as JSON
    let request = SubmitRequest::decode(&request.to_json()).unwrap();
    storage.append_message(request).unwrap();

    // Store -> reviewer as a JSON array
    let batch: Vec<Value> = storage
        .load_messages(&case_id)
        .unwrap()
        .iter()
        .map(|e| serde_json::from_str(&e.to_json()).unwrap())
        .collect();
    let decoded = Envelope::decode_batch(&Value::Array(batch).to_string()).unwrap();

    let envelope = decoded.into_iter().next().unwrap().unwrap();
    assert_eq!(reviewer.open_envelope(&envelope).unwrap().report, "over the wire");
}

#[test]
fn foreign_envelope_is_flagged() {
    #[derive(Clone)]
    struct MixingStorage(MemoryStorage<ManualEnv>, CaseId);

    impl Storage for MixingStorage {
        fn create_case(&self) -> Result<StoredCase, StorageError> {
            self.0.create_case()
        }
        fn load_case(&self, case_id: &CaseId) -> Result<Option<StoredCase>, StorageError> {
            self.0.load_case(case_id)
        }
        fn list_cases(&self) -> Result<Vec<CaseId>, StorageError> {
            self.0.list_cases()
        }
        fn append_message(&self, request: SubmitRequest) -> Result<Envelope, StorageError> {
            self.0.append_message(request)
        }
        fn load_messages(&self, case_id: &CaseId) -> Result<Vec<Envelope>, StorageError> {
            let mut own = self.0.load_messages(case_id)?;
            own.extend(self.0.load_messages(&self.1)?);
            Ok(own)
        }
    }

    let reviewer = Reviewer::new(sealdrop_crypto::PrivateKey::from_bytes([0x66; 32]));
    let memory = MemoryStorage::new(ManualEnv::new(0, 4));
    let mine = memory.create_case().unwrap().case_id;
    let theirs = memory.create_case().unwrap().case_id;

    let submitter = Submitter::new(*reviewer.public_key());
    submitter.submit(&memory, &mine, &ReportPayload::new("mine")).unwrap();
    submitter.submit(&memory, &theirs, &ReportPayload::new("theirs")).unwrap();

    let review = reviewer.review_case(&MixingStorage(memory, theirs), &mine).unwrap();

    assert_eq!(review.opened().count(), 1);
    assert!(matches!(review.reports[1].result, Err(ClientError::Envelope(_))));
    assert_eq!(review.sequence.duplicates, vec![0]);
}

#[test]
fn outages_are_retryable_and_leave_no_trace() {
    let reviewer = Reviewer::new(sealdrop_crypto::PrivateKey::from_bytes([0x77; 32]));
    let memory = MemoryStorage::new(ManualEnv::new(0, 8));
    let case_id = memory.create_case().unwrap().case_id;

    let chaotic = ChaoticStorage::new(memory.clone(), 1.0);
    let submitter = Submitter::new(*reviewer.public_key());

    let err = submitter.submit(&chaotic, &case_id, &ReportPayload::new("x")).unwrap_err();
    assert!(err.is_retryable());
    assert!(memory.load_messages(&case_id).unwrap().is_empty());

    // Retry against the healthy store succeeds at seq 0
    let envelope = submitter.submit(&memory, &case_id, &ReportPayload::new("x")).unwrap();
    assert_eq!(envelope.seq(), 0);
}

#[test]
fn malformed_report_errors_carry_no_plaintext() {
    let reviewer = Reviewer::new(sealdrop_crypto::PrivateKey::from_bytes([0x88; 32]));
    let storage = MemoryStorage::new(ManualEnv::new(0, 9));
    let case_id = storage.create_case().unwrap().case_id;

    // Authentic ciphertext whose plaintext is JSON of the wrong shape
    let plaintext = br#"{"report":"leak at facility 4","files":"SECRET-NAME-OF-INFORMANT"}"#;
    let sealed = sealdrop_crypto::seal(plaintext, reviewer.public_key()).unwrap();
    storage.append_message(SubmitRequest::new(case_id.clone(), sealed).unwrap()).unwrap();

    let review = reviewer.review_case(&storage, &case_id).unwrap();
    let err = review.reports[0].result.clone().unwrap_err();

    assert!(matches!(err, ClientError::Payload(_)));
    let rendered = format!("{err} {err:?}");
    assert!(!rendered.contains("SECRET-NAME-OF-INFORMANT"), "{rendered}");
    assert!(!rendered.contains("facility"), "{rendered}");
}
