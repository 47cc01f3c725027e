use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use sealdrop_proto::{CaseId, Envelope, SubmitRequest};
use tracing::{debug, info, warn};
use uuid::Builder;

use super::{Storage, StorageError, StoredCase};
use crate::{config::StoreConfig, env::Environment};

/// In-memory case store
///
/// All state sits behind one `Arc<Mutex<>>`, so clones share cases and every
/// append is serialized. Sequence assignment and the push into the log happen
/// inside the same critical section. Uses `lock().expect()`, which panics if
/// the mutex is poisoned.
#[derive(Clone)]
pub struct MemoryStorage<E: Environment> {
    env: E,
    config: StoreConfig,
    inner: Arc<Mutex<MemoryStorageInner>>,
}

#[derive(Default)]
struct MemoryStorageInner {
    cases: HashMap<CaseId, CaseState>,
}

struct CaseState {
    created_at: u64,
    expires_at: u64,
    messages: Vec<Envelope>,
}

impl CaseState {
    fn to_stored(&self, case_id: &CaseId) -> StoredCase {
        StoredCase {
            case_id: case_id.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            message_count: self.messages.len() as u64,
        }
    }
}

impl<E: Environment> MemoryStorage<E> {
    /// Create an empty store with default limits.
    pub fn new(env: E) -> Self {
        Self::with_config(env, StoreConfig::default())
    }

    /// Create an empty store with explicit limits.
    pub fn with_config(env: E, config: StoreConfig) -> Self {
        Self { env, config, inner: Arc::new(Mutex::new(MemoryStorageInner::default())) }
    }

    /// Limits this store enforces.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Total number of messages across all cases.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn total_message_count(&self) -> usize {
        let inner = self.inner.lock().expect("Mutex poisoned");
        inner.cases.values().map(|c| c.messages.len()).sum()
    }

    fn new_case_id(&self) -> Result<CaseId, StorageError> {
        let uuid = Builder::from_random_bytes(self.env.random_16()).into_uuid();
        Ok(CaseId::parse(&uuid.hyphenated().to_string())?)
    }
}

impl<E: Environment> Storage for MemoryStorage<E> {
    #[allow(clippy::expect_used)]
    fn create_case(&self) -> Result<StoredCase, StorageError> {
        let now = self.env.wall_clock_secs();
        let expires_at = now.saturating_add(self.config.case_ttl_secs);

        let mut inner = self.inner.lock().expect("Mutex poisoned");

        // 122 random bits make a repeat practically impossible, but a
        // deterministic test RNG can still produce one
        let case_id = loop {
            let candidate = self.new_case_id()?;
            if !inner.cases.contains_key(&candidate) {
                break candidate;
            }
        };

        let state = CaseState { created_at: now, expires_at, messages: Vec::new() };
        let stored = state.to_stored(&case_id);
        inner.cases.insert(case_id, state);

        info!(case_id = %stored.case_id, expires_at, "case created");
        Ok(stored)
    }

    #[allow(clippy::expect_used)]
    fn load_case(&self, case_id: &CaseId) -> Result<Option<StoredCase>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner.cases.get(case_id).map(|state| state.to_stored(case_id)))
    }

    #[allow(clippy::expect_used)]
    fn list_cases(&self) -> Result<Vec<CaseId>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner.cases.keys().cloned().collect())
    }

    #[allow(clippy::expect_used)]
    fn append_message(&self, request: SubmitRequest) -> Result<Envelope, StorageError> {
        let size = request.ciphertext_len();
        if size > self.config.max_ciphertext_size {
            warn!(case_id = %request.case_id(), size, max = self.config.max_ciphertext_size, "rejected oversize message");
            return Err(StorageError::PayloadTooLarge { size, max: self.config.max_ciphertext_size });
        }

        let now = self.env.wall_clock_secs();
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let Some(case) = inner.cases.get_mut(request.case_id()) else {
            debug!(case_id = %request.case_id(), "append to unknown case");
            return Err(StorageError::CaseNotFound(request.case_id().clone()));
        };

        if case.expires_at < now {
            debug!(case_id = %request.case_id(), expires_at = case.expires_at, now, "append to expired case");
            return Err(StorageError::CaseExpired {
                case_id: request.case_id().clone(),
                expires_at: case.expires_at,
            });
        }

        let Ok(seq) = u64::try_from(case.messages.len()) else {
            return Err(StorageError::SequenceExhausted(request.case_id().clone()));
        };
        if seq == u64::MAX {
            return Err(StorageError::SequenceExhausted(request.case_id().clone()));
        }

        let envelope = request.into_envelope(seq, now);
        case.messages.push(envelope.clone());

        debug_assert_eq!(case.messages.len() as u64, seq + 1);
        info!(case_id = %envelope.case_id(), seq, size, "message stored");

        Ok(envelope)
    }

    #[allow(clippy::expect_used)]
    fn load_messages(&self, case_id: &CaseId) -> Result<Vec<Envelope>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        let case = inner.cases.get(case_id).ok_or_else(|| StorageError::CaseNotFound(case_id.clone()))?;
        Ok(case.messages.clone())
    }
}
