//! Report payload: the structured plaintext that gets sealed.
//!
//! The payload only exists inside the encryption boundary. Decoding happens
//! after authentication succeeds, and every field is checked before anything
//! downstream sees it.

use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::{
    error::{ProtocolError, Result},
    fields::{decode_b64, encode_b64},
};

/// Maximum number of attachments per report
pub const MAX_ATTACHMENTS: usize = 64;

/// Maximum attachment name length in bytes
pub const MAX_ATTACHMENT_NAME_LEN: usize = 255;

/// A file carried alongside the report text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name as supplied by the submitter
    pub name: String,
    /// Raw file contents
    pub data: Vec<u8>,
}

/// Decrypted report: free text plus optional attachments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportPayload {
    /// Report body
    pub report: String,
    /// Attached files, in submission order
    pub files: Vec<Attachment>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PayloadWire {
    report: String,
    #[serde(default)]
    files: Vec<AttachmentWire>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttachmentWire {
    name: String,
    data: String,
}

impl ReportPayload {
    /// Text-only report.
    pub fn new(report: impl Into<String>) -> Self {
        Self { report: report.into(), files: Vec::new() }
    }

    /// Add an attachment.
    #[must_use]
    pub fn with_attachment(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.files.push(Attachment { name: name.into(), data });
        self
    }

    /// Check attachment count and names.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` naming the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.files.len() > MAX_ATTACHMENTS {
            return Err(ProtocolError::invalid_payload(format!(
                "{} attachments exceeds maximum {MAX_ATTACHMENTS}",
                self.files.len()
            )));
        }

        for (index, file) in self.files.iter().enumerate() {
            validate_name(&file.name)
                .map_err(|reason| ProtocolError::invalid_payload(format!("files[{index}]: {reason}")))?;
        }

        Ok(())
    }

    /// Encode to the bytes that get sealed.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` if the payload fails [`Self::validate`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let wire = PayloadWire {
            report: self.report.clone(),
            files: self
                .files
                .iter()
                .map(|f| AttachmentWire { name: f.name.clone(), data: encode_b64(&f.data) })
                .collect(),
        };

        let Ok(bytes) = serde_json::to_vec(&wire) else {
            unreachable!("payload wire form contains only strings");
        };
        Ok(bytes)
    }

    /// Decode opened plaintext.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` on non-UTF-8 or non-JSON input, unknown fields, bad
    /// base64, or any [`Self::validate`] violation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let wire: PayloadWire = serde_json::from_slice(bytes).map_err(|e| content_free_reason(&e))?;

        if wire.files.len() > MAX_ATTACHMENTS {
            return Err(ProtocolError::invalid_payload(format!(
                "{} attachments exceeds maximum {MAX_ATTACHMENTS}",
                wire.files.len()
            )));
        }

        let mut files = Vec::with_capacity(wire.files.len());
        for (index, file) in wire.files.into_iter().enumerate() {
            let data = decode_b64("data", &file.data).map_err(|_| {
                ProtocolError::invalid_payload(format!("files[{index}].data: not valid base64"))
            })?;
            files.push(Attachment { name: file.name, data });
        }

        let payload = Self { report: wire.report, files };
        payload.validate()?;
        Ok(payload)
    }

    /// Total attachment bytes.
    pub fn attachment_bytes(&self) -> usize {
        self.files.iter().map(|f| f.data.len()).sum()
    }
}

/// serde_json quotes offending values and unknown field names in its
/// messages. Those come from decrypted plaintext, so only the category and
/// position survive.
fn content_free_reason(err: &serde_json::Error) -> ProtocolError {
    let kind = match err.classify() {
        Category::Syntax => "not valid JSON",
        Category::Eof => "truncated JSON",
        Category::Data => "does not match the report layout",
        Category::Io => "unreadable",
    };
    ProtocolError::invalid_payload(format!("{kind} at line {} column {}", err.line(), err.column()))
}

fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }

    if name.len() > MAX_ATTACHMENT_NAME_LEN {
        return Err(format!("name is {} bytes, maximum {MAX_ATTACHMENT_NAME_LEN}", name.len()));
    }

    if name.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
        return Err("name must not contain path separators or control characters".to_string());
    }

    if name == "." || name == ".." {
        return Err("name must not be a relative path component".to_string());
    }

    Ok(())
}
