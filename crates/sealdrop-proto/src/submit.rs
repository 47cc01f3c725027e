//! Submitter-to-store request.
//!
//! Same field rules as [`Envelope`] minus `seq` and `created_at`, which only
//! the store assigns. A submitter has no way to choose its own position in
//! the case log.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sealdrop_crypto::{DIGEST_SIZE, Digest, NONCE_SIZE, PUBLIC_KEY_SIZE, PublicKey, SealedMessage};

use crate::{
    envelope::{Envelope, PROTOCOL_VERSION, check_ciphertext, read_version},
    error::{ProtocolError, Result},
    fields::{CaseId, decode_b64, decode_b64_fixed, encode_b64},
};

/// A sealed message addressed to a case, not yet sequenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    case_id: CaseId,
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_SIZE],
    hash: Digest,
    ephemeral_public_key: PublicKey,
}

#[derive(Serialize, Deserialize)]
struct SubmitRequestV1 {
    version: u64,
    case_id: String,
    ciphertext: String,
    nonce: String,
    hash: String,
    ephemeral_public_key: String,
}

impl SubmitRequest {
    /// Address a sealed message to a case.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge`: ciphertext exceeds the maximum message size
    /// - `InvalidField`: ciphertext shorter than the tag
    pub fn new(case_id: CaseId, sealed: SealedMessage) -> Result<Self> {
        check_ciphertext(&sealed.ciphertext)?;

        Ok(Self {
            case_id,
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            hash: sealed.hash,
            ephemeral_public_key: sealed.ephemeral_public_key,
        })
    }

    /// Target case.
    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    /// Ciphertext size in bytes.
    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext.len()
    }

    /// Turn into a stored envelope at the given position.
    ///
    /// Only the store calls this, inside its sequencing critical section.
    pub fn into_envelope(self, seq: u64, created_at: u64) -> Envelope {
        Envelope::from_parts(
            self.case_id,
            self.ciphertext,
            self.nonce,
            self.hash,
            self.ephemeral_public_key,
            seq,
            created_at,
        )
    }

    /// Serialize to the JSON transport form.
    pub fn to_json(&self) -> String {
        let Ok(json) = serde_json::to_string(&self.to_wire()) else {
            unreachable!("request wire form contains only strings and integers");
        };
        json
    }

    /// Parse the JSON transport form.
    ///
    /// # Errors
    ///
    /// Same as [`Envelope::decode`].
    pub fn decode(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ProtocolError::malformed(format!("not a JSON object: {e}")))?;
        Self::decode_value(&value)
    }

    /// Parse an already-parsed JSON value.
    pub fn decode_value(value: &Value) -> Result<Self> {
        match read_version(value)? {
            PROTOCOL_VERSION => {},
            other => return Err(ProtocolError::UnsupportedVersion(other)),
        }

        let wire = SubmitRequestV1::deserialize(value)
            .map_err(|e| ProtocolError::malformed(e.to_string()))?;

        let case_id = CaseId::parse(&wire.case_id).map_err(ProtocolError::into_malformed)?;
        let ciphertext = decode_b64("ciphertext", &wire.ciphertext)?;
        check_ciphertext(&ciphertext).map_err(ProtocolError::into_malformed)?;

        Ok(Self {
            case_id,
            ciphertext,
            nonce: decode_b64_fixed::<NONCE_SIZE>("nonce", &wire.nonce)?,
            hash: Digest::from_bytes(decode_b64_fixed::<DIGEST_SIZE>("hash", &wire.hash)?),
            ephemeral_public_key: PublicKey::from_bytes(decode_b64_fixed::<PUBLIC_KEY_SIZE>(
                "ephemeral_public_key",
                &wire.ephemeral_public_key,
            )?),
        })
    }

    fn to_wire(&self) -> SubmitRequestV1 {
        SubmitRequestV1 {
            version: PROTOCOL_VERSION,
            case_id: self.case_id.as_str().to_string(),
            ciphertext: encode_b64(&self.ciphertext),
            nonce: encode_b64(&self.nonce),
            hash: encode_b64(self.hash.as_bytes()),
            ephemeral_public_key: encode_b64(self.ephemeral_public_key.as_bytes()),
        }
    }
}

impl Serialize for SubmitRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SubmitRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode_value(&value).map_err(serde::de::Error::custom)
    }
}
