//! CLI errors.

use sealdrop_client::{ClientError, KeyStoreError};
use sealdrop_proto::ProtocolError;
use thiserror::Error;

/// Errors that stop a command.
#[derive(Error, Debug)]
pub enum CliError {
    /// Input or output file could not be used
    #[error("{path}: {source}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Command-line value is not usable
    #[error("invalid {argument}: {reason}")]
    InvalidArgument {
        /// Flag name
        argument: &'static str,
        /// What was wrong
        reason: String,
    },

    /// Envelope file is not a JSON array
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Sealing or key loading failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Key file could not be created
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
}

impl CliError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }
}
