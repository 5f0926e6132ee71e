//! Error types for gitsync-report.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while composing or delivering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading templates or staging the attachment.
    #[error("report io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("environment variable {var} is not set (smtp password_env)")]
    MissingEnv { var: String },

    #[error("failed to run mail command `{command}`: {source}")]
    MailSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mail command `{command}` exited with {status}: {stderr}")]
    MailCommand {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build mail message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.into(),
        source,
    }
}
