//! Store configuration.

use sealdrop_proto::MAX_CIPHERTEXT_SIZE;

/// Default case lifetime: 30 days
pub const DEFAULT_CASE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Limits applied by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Largest ciphertext accepted per message, in bytes
    pub max_ciphertext_size: usize,
    /// Seconds a case accepts messages after creation
    pub case_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_ciphertext_size: MAX_CIPHERTEXT_SIZE, case_ttl_secs: DEFAULT_CASE_TTL_SECS }
    }
}
