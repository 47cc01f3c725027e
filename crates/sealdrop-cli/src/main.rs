//! Sealdrop command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Reviewer: create a key pair, share the printed public key
//! sealdrop keygen --out reviewer.key
//!
//! # Submitter: seal a report for the reviewer
//! sealdrop seal --reviewer-public <hex> --case-id <id> --report report.txt --attach memo.pdf
//!
//! # Reviewer: open envelopes fetched from the store
//! SEALDROP_KEY_FILE=reviewer.key sealdrop open --envelopes case.json
//! ```
//!
//! Results go to stdout; logs go to stderr.

use std::{io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use sealdrop_cli::{keygen, open_envelopes, seal_report};
use sealdrop_client::FileKeyStore;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sealdrop anonymous report tool
#[derive(Parser, Debug)]
#[command(name = "sealdrop")]
#[command(about = "Seal and open anonymous encrypted reports")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a reviewer key file and print its public key
    Keygen {
        /// Where to write the private key (must not exist)
        #[arg(long)]
        out: PathBuf,
    },

    /// Seal a report and print the submit request JSON
    Seal {
        /// Reviewer public key, 64 hex characters
        #[arg(long)]
        reviewer_public: String,

        /// Case the report belongs to
        #[arg(long)]
        case_id: String,

        /// File holding the report text
        #[arg(long)]
        report: PathBuf,

        /// Files to attach (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// Open a JSON array of envelopes and print the reports
    Open {
        /// Reviewer private key file
        #[arg(long, env = "SEALDROP_KEY_FILE")]
        key: PathBuf,

        /// File holding a JSON array of envelopes
        #[arg(long)]
        envelopes: PathBuf,

        /// Save attachments under this directory
        #[arg(long)]
        attachments_dir: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut stdout = io::stdout().lock();

    match args.command {
        Command::Keygen { out } => {
            keygen(&out, &mut stdout)?;
            tracing::info!(path = %out.display(), "reviewer key written");
        },
        Command::Seal { reviewer_public, case_id, report, attachments } => {
            seal_report(&reviewer_public, &case_id, &report, &attachments, &mut stdout)?;
        },
        Command::Open { key, envelopes, attachments_dir } => {
            let summary = open_envelopes(
                &FileKeyStore::new(key),
                &envelopes,
                attachments_dir.as_deref(),
                &mut stdout,
            )?;

            if !summary.is_success() {
                tracing::error!(
                    failed = summary.failed,
                    discontinuous_cases = summary.discontinuous_cases,
                    "some envelopes could not be trusted"
                );
                return Ok(ExitCode::FAILURE);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
