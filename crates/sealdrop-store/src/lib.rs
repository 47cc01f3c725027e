//! Sealdrop Case Store
//!
//! Holds cases and their append-only message logs on behalf of submitters
//! and reviewers. The store never sees plaintext or keys; it is trusted only
//! to keep what it is given, and reviewers check even that through
//! [`sealdrop_proto::check_sequence`].
//!
//! # Components
//!
//! - [`Storage`]: synchronous storage trait
//! - [`MemoryStorage`]: in-process reference store
//! - [`ChaoticStorage`]: fault-injecting wrapper for tests
//! - [`Environment`]: clock and randomness, swapped for [`ManualEnv`] in tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod storage;

pub use config::{DEFAULT_CASE_TTL_SECS, StoreConfig};
pub use env::{Environment, ManualEnv, SystemEnv};
pub use error::StorageError;
pub use storage::{ChaoticStorage, MemoryStorage, Storage, StoredCase};
