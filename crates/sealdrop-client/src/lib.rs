//! Sealdrop Client Roles
//!
//! The two ends of a report: a [`Submitter`] who seals to a reviewer public
//! key and appends to a case, and a [`Reviewer`] who holds the private key,
//! opens envelopes and audits the case log.
//!
//! # Trust
//!
//! - The store is untrusted. Reviewers authenticate every envelope and check
//!   the sequence numbers the store assigned.
//! - The reviewer private key is loaded only through a [`ReviewerKeyStore`];
//!   [`FileKeyStore`] refuses key files readable by anyone but the owner.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod key_store;
pub mod reviewer;
pub mod submitter;

pub use error::{ClientError, KeyStoreError};
pub use key_store::{FileKeyStore, ReviewerKeyStore, generate_reviewer_key};
pub use reviewer::{CaseReview, OpenedReport, Reviewer};
pub use submitter::Submitter;
