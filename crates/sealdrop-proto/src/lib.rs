//! Sealdrop Wire Protocol
//!
//! JSON transport units exchanged with the untrusted store, plus the
//! structured plaintext that travels inside them.
//!
//! # Units
//!
//! - [`SubmitRequest`]: submitter to store. No sequence number.
//! - [`Envelope`]: store to reviewer. Carries the store-assigned `seq` and
//!   acceptance time.
//! - [`ReportPayload`]: the plaintext sealed inside an envelope.
//!
//! Binary fields travel as standard base64. Every unit declares `version`;
//! decoding dispatches on it first and rejects versions it does not know.
//!
//! The codec never performs cryptography. It checks shape only, so an
//! envelope that decodes cleanly may still fail authentication later.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod error;
mod fields;
pub mod payload;
pub mod sequence;
pub mod submit;

pub use envelope::{Envelope, EnvelopeV1, MAX_CIPHERTEXT_SIZE, PROTOCOL_VERSION, VersionedEnvelope};
pub use error::{ProtocolError, Result};
pub use fields::{CaseId, MAX_CASE_ID_LEN};
pub use payload::{Attachment, MAX_ATTACHMENT_NAME_LEN, MAX_ATTACHMENTS, ReportPayload};
pub use sequence::{SequenceReport, check_sequence};
pub use submit::SubmitRequest;
