//! Sealdrop command-line operations.
//!
//! Each command reads its inputs from files, writes its result to the given
//! writer, and logs to the tracing subscriber. The binary wires these to
//! stdout and stderr.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod error;

pub use commands::{OpenSummary, keygen, open_envelopes, seal_report};
pub use error::CliError;
