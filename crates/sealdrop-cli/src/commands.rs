//! Command implementations.

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use sealdrop_client::{ReviewerKeyStore, Reviewer, Submitter, generate_reviewer_key};
use sealdrop_crypto::PublicKey;
use sealdrop_proto::{CaseId, Envelope, ReportPayload, check_sequence};
use tracing::{info, warn};

use crate::error::CliError;

/// Outcome of an `open` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenSummary {
    /// Envelopes decoded and opened
    pub opened: usize,
    /// Envelopes that failed to decode or open
    pub failed: usize,
    /// Cases whose envelopes showed gaps or duplicates
    pub discontinuous_cases: usize,
}

impl OpenSummary {
    /// Every envelope opened and every case log was contiguous.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.discontinuous_cases == 0
    }
}

/// Create a reviewer key file and write its public key hex to `out`.
pub fn keygen(key_path: &Path, out: &mut impl Write) -> Result<PublicKey, CliError> {
    let public_key = generate_reviewer_key(key_path)?;
    writeln!(out, "{}", hex::encode(public_key.as_bytes()))
        .map_err(|e| CliError::io(Path::new("<stdout>"), e))?;
    Ok(public_key)
}

/// Seal a report file plus attachments and write the submit request JSON.
pub fn seal_report(
    reviewer_public_hex: &str,
    case_id: &str,
    report_path: &Path,
    attachments: &[PathBuf],
    out: &mut impl Write,
) -> Result<(), CliError> {
    let reviewer_public = parse_public_key(reviewer_public_hex)?;
    let case_id = CaseId::parse(case_id).map_err(|e| CliError::InvalidArgument {
        argument: "--case-id",
        reason: e.to_string(),
    })?;

    let report = fs::read_to_string(report_path).map_err(|e| CliError::io(report_path, e))?;
    let mut payload = ReportPayload::new(report);

    for path in attachments {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Err(CliError::InvalidArgument {
                argument: "--attach",
                reason: format!("{} has no UTF-8 file name", path.display()),
            });
        };
        let data = fs::read(path).map_err(|e| CliError::io(path, e))?;
        payload = payload.with_attachment(name, data);
    }

    let request = Submitter::new(reviewer_public).seal_report(&case_id, &payload)?;
    info!(
        case_id = %case_id,
        attachments = payload.files.len(),
        size = request.ciphertext_len(),
        "report sealed"
    );

    writeln!(out, "{}", request.to_json()).map_err(|e| CliError::io(Path::new("<stdout>"), e))?;
    Ok(())
}

/// Open every envelope in a JSON array file and write the reports to `out`.
///
/// A bad envelope is logged and counted, never fatal. Attachments are saved
/// under `attachments_dir/<case>/<seq>/` when a directory is given; existing
/// files are never overwritten.
pub fn open_envelopes(
    key_store: &impl ReviewerKeyStore,
    envelopes_path: &Path,
    attachments_dir: Option<&Path>,
    out: &mut impl Write,
) -> Result<OpenSummary, CliError> {
    let reviewer = Reviewer::from_key_store(key_store)?;
    let body = fs::read_to_string(envelopes_path).map_err(|e| CliError::io(envelopes_path, e))?;
    let items = Envelope::decode_batch(&body)?;

    let mut summary = OpenSummary::default();
    let mut by_case: BTreeMap<CaseId, Vec<Envelope>> = BTreeMap::new();

    for (index, item) in items.into_iter().enumerate() {
        let envelope = match item {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(index, error = %err, "envelope rejected");
                summary.failed += 1;
                continue;
            },
        };

        match reviewer.open_envelope(&envelope) {
            Ok(payload) => {
                write_report(out, &envelope, &payload)?;
                summary.opened += 1;

                if let Some(dir) = attachments_dir {
                    if let Err(err) = save_attachments(dir, &envelope, &payload) {
                        warn!(case_id = %envelope.case_id(), seq = envelope.seq(), error = %err, "attachments not saved");
                        summary.failed += 1;
                    }
                }
            },
            Err(err) => {
                warn!(index, case_id = %envelope.case_id(), seq = envelope.seq(), error = %err, "envelope rejected");
                summary.failed += 1;
            },
        }

        by_case.entry(envelope.case_id().clone()).or_default().push(envelope);
    }

    for (case_id, envelopes) in &by_case {
        let report = check_sequence(envelopes);
        if !report.is_clean() {
            warn!(
                case_id = %case_id,
                gaps = ?report.gaps,
                duplicates = ?report.duplicates,
                "case log is not contiguous"
            );
            summary.discontinuous_cases += 1;
        }
    }

    info!(opened = summary.opened, failed = summary.failed, "envelopes processed");
    Ok(summary)
}

fn parse_public_key(text: &str) -> Result<PublicKey, CliError> {
    let bytes = hex::decode(text.trim()).map_err(|e| CliError::InvalidArgument {
        argument: "--reviewer-public",
        reason: e.to_string(),
    })?;

    PublicKey::from_slice(&bytes).map_err(|e| CliError::InvalidArgument {
        argument: "--reviewer-public",
        reason: e.to_string(),
    })
}

fn write_report(
    out: &mut impl Write,
    envelope: &Envelope,
    payload: &ReportPayload,
) -> Result<(), CliError> {
    let stdout = |e| CliError::io(Path::new("<stdout>"), e);

    writeln!(
        out,
        "=== case {} seq {} (received {}) ===",
        envelope.case_id(),
        envelope.seq(),
        envelope.created_at()
    )
    .map_err(stdout)?;
    writeln!(out, "{}", payload.report).map_err(stdout)?;
    for file in &payload.files {
        writeln!(out, "[attachment] {} ({} bytes)", file.name, file.data.len()).map_err(stdout)?;
    }
    Ok(())
}

fn save_attachments(dir: &Path, envelope: &Envelope, payload: &ReportPayload) -> Result<(), CliError> {
    if payload.files.is_empty() {
        return Ok(());
    }

    let target = dir.join(envelope.case_id().as_str()).join(envelope.seq().to_string());
    fs::create_dir_all(&target).map_err(|e| CliError::io(&target, e))?;

    // Names are validated by the payload decoder: no separators, no `..`
    for file in &payload.files {
        let path = target.join(&file.name);
        let mut handle = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| CliError::io(&path, e))?;
        handle.write_all(&file.data).map_err(|e| CliError::io(&path, e))?;
    }

    Ok(())
}
