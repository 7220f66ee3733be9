//! Error types for startup and transport faults
//!
//! Rule evaluation and line parsing are total: they never produce errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the bot outside the moderation pipeline
#[derive(Debug, Error)]
pub enum BotError {
    #[error("failed to read credential file {path}: {source}")]
    Credential {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential file {0} is empty")]
    EmptyCredential(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
