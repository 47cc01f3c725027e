//! Shared field types and transport encoding helpers.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ProtocolError, Result};

/// Maximum case identifier length in bytes
pub const MAX_CASE_ID_LEN: usize = 64;

/// Identifier of a case: the grouping of envelopes for one conversation.
///
/// # Invariants
///
/// - 1 to [`MAX_CASE_ID_LEN`] ASCII characters from `[A-Za-z0-9_-]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId(String);

impl CaseId {
    /// Validate and wrap a case identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(ProtocolError::InvalidField {
                field: "case_id",
                reason: "must not be empty".to_string(),
            });
        }

        if raw.len() > MAX_CASE_ID_LEN {
            return Err(ProtocolError::InvalidField {
                field: "case_id",
                reason: format!("{} bytes exceeds maximum {MAX_CASE_ID_LEN}", raw.len()),
            });
        }

        if !raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
            return Err(ProtocolError::InvalidField {
                field: "case_id",
                reason: "only ASCII letters, digits, '-' and '_' are allowed".to_string(),
            });
        }

        Ok(Self(raw.to_string()))
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CaseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) fn encode_b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode_b64(field: &'static str, text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|_| ProtocolError::malformed(format!("{field}: not valid base64")))
}

pub(crate) fn decode_b64_fixed<const N: usize>(field: &'static str, text: &str) -> Result<[u8; N]> {
    let bytes = decode_b64(field, text)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        ProtocolError::malformed(format!("{field}: expected {N} bytes, got {}", bytes.len()))
    })
}

pub(crate) fn fixed_field<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N]> {
    <[u8; N]>::try_from(bytes).map_err(|_| ProtocolError::InvalidField {
        field,
        reason: format!("expected {N} bytes, got {}", bytes.len()),
    })
}
