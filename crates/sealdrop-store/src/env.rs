//! Environment abstraction for deterministic testing.
//!
//! Decouples the store from system resources (wall clock, randomness).
//! Production uses [`SystemEnv`]; tests drive [`ManualEnv`] to pin time and
//! make case ids reproducible.

use std::sync::{Arc, Mutex};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Time and randomness available to the store.
///
/// # Invariants
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `wall_clock_secs()` is Unix seconds
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time in Unix seconds.
    fn wall_clock_secs(&self) -> u64;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Sixteen random bytes, the raw material for a case id.
    fn random_16(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        bytes
    }
}

/// Production environment: system clock and OS RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. A store without working randomness would hand
/// out predictable case ids, which is worse than stopping.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

/// Deterministic environment with a hand-driven clock.
///
/// Randomness is a seeded ChaCha8 stream, so the same seed always yields the
/// same case ids. Never use outside tests and simulations.
#[derive(Debug, Clone)]
pub struct ManualEnv {
    state: Arc<Mutex<ManualState>>,
}

#[derive(Debug)]
struct ManualState {
    now: u64,
    rng: ChaCha8Rng,
}

impl ManualEnv {
    /// Start the clock at `now` with the given RNG seed.
    pub fn new(now: u64, seed: u64) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        Self { state: Arc::new(Mutex::new(ManualState { now, rng })) }
    }

    /// Move the clock forward.
    #[allow(clippy::expect_used)]
    pub fn advance(&self, secs: u64) {
        let mut state = self.state.lock().expect("Mutex poisoned");
        state.now = state.now.saturating_add(secs);
    }

    /// Set the clock.
    #[allow(clippy::expect_used)]
    pub fn set_time(&self, now: u64) {
        self.state.lock().expect("Mutex poisoned").now = now;
    }
}

impl Environment for ManualEnv {
    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        self.state.lock().expect("Mutex poisoned").now
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.state.lock().expect("Mutex poisoned").rng.fill_bytes(buffer);
    }
}
