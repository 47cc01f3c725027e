//! Stored message envelope and its versioned JSON codec.
//!
//! An `Envelope` is the unit the untrusted store keeps and hands back to
//! reviewers. The codec never interprets ciphertext; it only checks that each
//! field has the shape the protocol requires.
//!
//! # Invariants
//!
//! - Immutable once constructed. All fields are private.
//! - Every envelope on the wire declares `version`. Decoding dispatches on it
//!   before reading any other field and rejects unknown versions.
//! - `encode` then `decode` yields the same fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sealdrop_crypto::{DIGEST_SIZE, Digest, NONCE_SIZE, PUBLIC_KEY_SIZE, PublicKey, TAG_SIZE};

use crate::{
    error::{ProtocolError, Result},
    fields::{CaseId, decode_b64, decode_b64_fixed, encode_b64, fixed_field},
};

/// Current wire protocol version
pub const PROTOCOL_VERSION: u64 = 1;

/// Maximum ciphertext size in bytes (1 MiB)
pub const MAX_CIPHERTEXT_SIZE: usize = 1024 * 1024;

/// One stored message of a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    case_id: CaseId,
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_SIZE],
    hash: Digest,
    ephemeral_public_key: PublicKey,
    seq: u64,
    created_at: u64,
}

/// Validate a ciphertext length against protocol bounds.
pub(crate) fn check_ciphertext(ciphertext: &[u8]) -> Result<()> {
    if ciphertext.len() > MAX_CIPHERTEXT_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: ciphertext.len(),
            max: MAX_CIPHERTEXT_SIZE,
        });
    }

    if ciphertext.len() < TAG_SIZE {
        return Err(ProtocolError::InvalidField {
            field: "ciphertext",
            reason: format!("{} bytes is shorter than the {TAG_SIZE}-byte tag", ciphertext.len()),
        });
    }

    Ok(())
}

impl Envelope {
    /// Assemble an envelope from its fields.
    ///
    /// Pure data assembly; no cryptography happens here.
    ///
    /// # Errors
    ///
    /// - `InvalidField`: bad case id, or a fixed-width field of the wrong size
    /// - `PayloadTooLarge`: ciphertext exceeds [`MAX_CIPHERTEXT_SIZE`]
    pub fn encode(
        case_id: &str,
        ciphertext: &[u8],
        nonce: &[u8],
        hash: &[u8],
        ephemeral_public_key: &[u8],
        seq: u64,
        created_at: u64,
    ) -> Result<Self> {
        let case_id = CaseId::parse(case_id)?;
        check_ciphertext(ciphertext)?;
        let nonce = fixed_field::<NONCE_SIZE>("nonce", nonce)?;
        let hash = fixed_field::<DIGEST_SIZE>("hash", hash)?;
        let ephemeral_public_key =
            fixed_field::<PUBLIC_KEY_SIZE>("ephemeral_public_key", ephemeral_public_key)?;

        Ok(Self {
            case_id,
            ciphertext: ciphertext.to_vec(),
            nonce,
            hash: Digest::from_bytes(hash),
            ephemeral_public_key: PublicKey::from_bytes(ephemeral_public_key),
            seq,
            created_at,
        })
    }

    /// Build from already-validated typed parts.
    pub(crate) fn from_parts(
        case_id: CaseId,
        ciphertext: Vec<u8>,
        nonce: [u8; NONCE_SIZE],
        hash: Digest,
        ephemeral_public_key: PublicKey,
        seq: u64,
        created_at: u64,
    ) -> Self {
        Self { case_id, ciphertext, nonce, hash, ephemeral_public_key, seq, created_at }
    }

    /// Case this envelope belongs to.
    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    /// Opaque ciphertext including the authentication tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Per-message nonce.
    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Digest of the plaintext (authenticated, not encrypted).
    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    /// Submitter's ephemeral public key.
    pub fn ephemeral_public_key(&self) -> &PublicKey {
        &self.ephemeral_public_key
    }

    /// Store-assigned sequence number within the case.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Unix timestamp (seconds) at which the store accepted the message.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Serialize to the JSON transport form.
    pub fn to_json(&self) -> String {
        let Ok(json) = serde_json::to_string(&self.to_wire()) else {
            unreachable!("envelope wire form contains only strings and integers");
        };
        json
    }

    /// Parse the JSON transport form.
    ///
    /// # Errors
    ///
    /// - `MalformedEnvelope`: not JSON, missing or mistyped field, bad base64,
    ///   wrong fixed width, negative `seq`
    /// - `UnsupportedVersion`: `version` is not [`PROTOCOL_VERSION`]
    /// - `PayloadTooLarge`: ciphertext exceeds [`MAX_CIPHERTEXT_SIZE`]
    pub fn decode(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ProtocolError::malformed(format!("not a JSON object: {e}")))?;
        Self::decode_value(&value)
    }

    /// Parse an already-parsed JSON value.
    pub fn decode_value(value: &Value) -> Result<Self> {
        match VersionedEnvelope::from_value(value)? {
            VersionedEnvelope::V1(wire) => wire.into_envelope(),
        }
    }

    /// Parse a JSON array of envelopes, one result per element.
    ///
    /// A malformed element never affects its neighbours. Only a body that is
    /// not a JSON array at all fails as a whole.
    pub fn decode_batch(json: &str) -> Result<Vec<Result<Self>>> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ProtocolError::malformed(format!("not a JSON array: {e}")))?;

        let Value::Array(items) = value else {
            return Err(ProtocolError::malformed("expected a JSON array of envelopes"));
        };

        Ok(items.iter().map(Self::decode_value).collect())
    }

    fn to_wire(&self) -> EnvelopeV1 {
        EnvelopeV1 {
            version: PROTOCOL_VERSION,
            case_id: self.case_id.as_str().to_string(),
            ciphertext: encode_b64(&self.ciphertext),
            nonce: encode_b64(&self.nonce),
            hash: encode_b64(self.hash.as_bytes()),
            ephemeral_public_key: encode_b64(self.ephemeral_public_key.as_bytes()),
            seq: self.seq,
            created_at: self.created_at,
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Envelope layouts keyed by protocol version.
///
/// Adding a version means adding a variant; every dispatch site is an
/// exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedEnvelope {
    /// Version 1: encrypted, ephemeral-key based
    V1(EnvelopeV1),
}

impl VersionedEnvelope {
    /// Read `version`, then decode the matching layout.
    pub fn from_value(value: &Value) -> Result<Self> {
        let version = read_version(value)?;
        match version {
            1 => EnvelopeV1::deserialize(value)
                .map(Self::V1)
                .map_err(|e| ProtocolError::malformed(e.to_string())),
            other => Err(ProtocolError::UnsupportedVersion(other)),
        }
    }
}

pub(crate) fn read_version(value: &Value) -> Result<u64> {
    let Value::Object(map) = value else {
        return Err(ProtocolError::malformed("expected a JSON object"));
    };

    let Some(version) = map.get("version") else {
        return Err(ProtocolError::malformed("missing field `version`"));
    };

    version
        .as_u64()
        .ok_or_else(|| ProtocolError::malformed("`version` must be a non-negative integer"))
}

/// Version 1 wire layout: binary fields as standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeV1 {
    /// Always [`PROTOCOL_VERSION`]
    pub version: u64,
    /// Case identifier
    pub case_id: String,
    /// Base64 ciphertext
    pub ciphertext: String,
    /// Base64 24-byte nonce
    pub nonce: String,
    /// Base64 32-byte digest
    pub hash: String,
    /// Base64 32-byte X25519 public key
    pub ephemeral_public_key: String,
    /// Store-assigned sequence number
    pub seq: u64,
    /// Unix seconds
    pub created_at: u64,
}

impl EnvelopeV1 {
    fn into_envelope(self) -> Result<Envelope> {
        let case_id = CaseId::parse(&self.case_id).map_err(ProtocolError::into_malformed)?;
        let ciphertext = decode_b64("ciphertext", &self.ciphertext)?;
        check_ciphertext(&ciphertext).map_err(ProtocolError::into_malformed)?;
        let nonce = decode_b64_fixed::<NONCE_SIZE>("nonce", &self.nonce)?;
        let hash = decode_b64_fixed::<DIGEST_SIZE>("hash", &self.hash)?;
        let ephemeral_public_key =
            decode_b64_fixed::<PUBLIC_KEY_SIZE>("ephemeral_public_key", &self.ephemeral_public_key)?;

        Ok(Envelope::from_parts(
            case_id,
            ciphertext,
            nonce,
            Digest::from_bytes(hash),
            PublicKey::from_bytes(ephemeral_public_key),
            self.seq,
            self.created_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Envelope {
        Envelope::encode("case-1", &[0xC1; 40], &[0x4E; 24], &[0x48; 32], &[0x09; 32], 3, 1_700_000_000)
            .unwrap()
    }

    fn sample_value() -> Value {
        serde_json::from_str(&sample().to_json()).unwrap()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let envelope = sample();
        let decoded = Envelope::decode(&envelope.to_json()).unwrap();

        assert_eq!(decoded, envelope);
        assert_eq!(decoded.case_id().as_str(), "case-1");
        assert_eq!(decoded.ciphertext(), &[0xC1; 40]);
        assert_eq!(decoded.nonce(), &[0x4E; 24]);
        assert_eq!(decoded.hash().as_bytes(), &[0x48; 32]);
        assert_eq!(decoded.ephemeral_public_key().as_bytes(), &[0x09; 32]);
        assert_eq!(decoded.seq(), 3);
        assert_eq!(decoded.created_at(), 1_700_000_000);
    }

    #[test]
    fn wire_form_declares_version() {
        assert_eq!(sample_value()["version"], json!(1));
    }

    #[test]
    fn decode_missing_nonce_is_malformed() {
        let mut value = sample_value();
        value.as_object_mut().unwrap().remove("nonce");

        let result = Envelope::decode(&value.to_string());
        assert!(matches!(result, Err(ProtocolError::MalformedEnvelope { reason }) if reason.contains("nonce")));
    }

    #[test]
    fn decode_missing_version_is_malformed() {
        let mut value = sample_value();
        value.as_object_mut().unwrap().remove("version");

        assert!(matches!(
            Envelope::decode(&value.to_string()),
            Err(ProtocolError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn decode_unknown_version_is_rejected() {
        let mut value = sample_value();
        value["version"] = json!(2);

        assert_eq!(Envelope::decode(&value.to_string()), Err(ProtocolError::UnsupportedVersion(2)));
    }

    #[test]
    fn decode_legacy_plaintext_variant_is_rejected() {
        let legacy = json!({
            "case_id": "case-1",
            "sender_role": "whistleblower",
            "ciphertext": "aGVsbG8=",
            "seq": 0,
        });

        assert!(matches!(
            Envelope::decode(&legacy.to_string()),
            Err(ProtocolError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn decode_negative_seq_is_malformed() {
        let mut value = sample_value();
        value["seq"] = json!(-1);

        assert!(matches!(
            Envelope::decode(&value.to_string()),
            Err(ProtocolError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn decode_wrong_type_is_malformed() {
        let mut value = sample_value();
        value["ciphertext"] = json!([1, 2, 3]);

        assert!(matches!(
            Envelope::decode(&value.to_string()),
            Err(ProtocolError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn decode_invalid_base64_is_malformed() {
        let mut value = sample_value();
        value["hash"] = json!("%%%not-base64%%%");

        assert!(matches!(
            Envelope::decode(&value.to_string()),
            Err(ProtocolError::MalformedEnvelope { reason }) if reason.contains("hash")
        ));
    }

    #[test]
    fn decode_short_public_key_is_malformed() {
        let mut value = sample_value();
        value["ephemeral_public_key"] = json!(encode_b64(&[1u8; 31]));

        assert!(matches!(
            Envelope::decode(&value.to_string()),
            Err(ProtocolError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn decode_bad_case_id_is_malformed() {
        let mut value = sample_value();
        value["case_id"] = json!("../../etc");

        assert!(matches!(
            Envelope::decode(&value.to_string()),
            Err(ProtocolError::MalformedEnvelope { reason }) if reason.contains("case_id")
        ));
    }

    #[test]
    fn decode_not_an_object_is_malformed() {
        assert!(matches!(Envelope::decode("[1,2]"), Err(ProtocolError::MalformedEnvelope { .. })));
        assert!(matches!(Envelope::decode("nonsense"), Err(ProtocolError::MalformedEnvelope { .. })));
    }

    #[test]
    fn encode_rejects_oversize_ciphertext() {
        let big = vec![0u8; MAX_CIPHERTEXT_SIZE + 1];
        let result = Envelope::encode("case-1", &big, &[0; 24], &[0; 32], &[0; 32], 0, 0);

        assert_eq!(
            result,
            Err(ProtocolError::PayloadTooLarge { size: MAX_CIPHERTEXT_SIZE + 1, max: MAX_CIPHERTEXT_SIZE })
        );
    }

    #[test]
    fn encode_accepts_max_ciphertext() {
        let max = vec![0u8; MAX_CIPHERTEXT_SIZE];
        assert!(Envelope::encode("case-1", &max, &[0; 24], &[0; 32], &[0; 32], 0, 0).is_ok());
    }

    #[test]
    fn encode_rejects_ciphertext_shorter_than_tag() {
        let result = Envelope::encode("case-1", &[0; 15], &[0; 24], &[0; 32], &[0; 32], 0, 0);
        assert!(matches!(result, Err(ProtocolError::InvalidField { field: "ciphertext", .. })));
    }

    #[test]
    fn encode_rejects_wrong_nonce_width() {
        let result = Envelope::encode("case-1", &[0; 16], &[0; 12], &[0; 32], &[0; 32], 0, 0);
        assert!(matches!(result, Err(ProtocolError::InvalidField { field: "nonce", .. })));
    }

    #[test]
    fn encode_rejects_wrong_hash_width() {
        let result = Envelope::encode("case-1", &[0; 16], &[0; 24], &[0; 20], &[0; 32], 0, 0);
        assert!(matches!(result, Err(ProtocolError::InvalidField { field: "hash", .. })));
    }

    #[test]
    fn batch_isolates_bad_elements() {
        let good = sample_value();
        let mut bad = sample_value();
        bad.as_object_mut().unwrap().remove("nonce");

        let body = json!([good, bad, good]).to_string();
        let results = Envelope::decode_batch(&body).unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ProtocolError::MalformedEnvelope { .. })));
        assert!(results[2].is_ok());
    }

    #[test]
    fn batch_rejects_non_array_body() {
        assert!(Envelope::decode_batch("{}").is_err());
    }

    #[test]
    fn serde_matches_codec() {
        let envelope = sample();
        let via_serde: Envelope = serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(via_serde, envelope);
    }
}
