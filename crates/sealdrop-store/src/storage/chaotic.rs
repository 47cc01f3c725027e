//! Fault-injecting storage wrapper
//!
//! Delegates to a real store but fails a seeded fraction of calls with
//! [`StorageError::Unavailable`]. Exercises the retry classification in
//! callers without a real flaky backend.

use std::sync::{Arc, Mutex};

use sealdrop_proto::{CaseId, Envelope, SubmitRequest};

use super::{Storage, StorageError, StoredCase};

/// Storage wrapper that randomly injects outages
///
/// Failed calls never reach the inner store, so an injected failure on
/// `append_message` leaves the case log untouched.
#[derive(Clone)]
pub struct ChaoticStorage<S: Storage> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    rng: Arc<Mutex<ChaoticRng>>,
    injected: Arc<Mutex<usize>>,
}

/// Linear congruential generator; reproducible for a given seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    /// Next value in [0.0, 1.0)
    #[allow(clippy::cast_precision_loss)]
    fn next(&mut self) -> f64 {
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: Storage> ChaoticStorage<S> {
    /// Wrap `inner` with a fixed default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x5EA1_D409_C0FF_EE00)
    }

    /// Wrap `inner` with an explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng { state: seed })),
            injected: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying storage, for checking state after chaos.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of failures injected so far.
    #[allow(clippy::expect_used)]
    pub fn injected_failures(&self) -> usize {
        *self.injected.lock().expect("Mutex poisoned")
    }

    #[allow(clippy::expect_used)]
    fn maybe_fail(&self, operation: &'static str) -> Result<(), StorageError> {
        let fail = self.rng.lock().expect("Mutex poisoned").next() < self.failure_rate;
        if fail {
            *self.injected.lock().expect("Mutex poisoned") += 1;
            tracing::debug!(operation, "injected storage failure");
            return Err(StorageError::Unavailable(format!("injected failure in {operation}")));
        }
        Ok(())
    }
}

impl<S: Storage> Storage for ChaoticStorage<S> {
    fn create_case(&self) -> Result<StoredCase, StorageError> {
        self.maybe_fail("create_case")?;
        self.inner.create_case()
    }

    fn load_case(&self, case_id: &CaseId) -> Result<Option<StoredCase>, StorageError> {
        self.maybe_fail("load_case")?;
        self.inner.load_case(case_id)
    }

    fn list_cases(&self) -> Result<Vec<CaseId>, StorageError> {
        self.maybe_fail("list_cases")?;
        self.inner.list_cases()
    }

    fn append_message(&self, request: SubmitRequest) -> Result<Envelope, StorageError> {
        self.maybe_fail("append_message")?;
        self.inner.append_message(request)
    }

    fn load_messages(&self, case_id: &CaseId) -> Result<Vec<Envelope>, StorageError> {
        self.maybe_fail("load_messages")?;
        self.inner.load_messages(case_id)
    }
}
