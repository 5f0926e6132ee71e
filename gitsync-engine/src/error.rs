//! Error types for gitsync-engine.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from a sync attempt.
///
/// A non-zero git exit is not an error; it is a `CommandStatus`. Errors are
/// either the repository-level verdict (`ManualIntervention`) or something the
/// engine did not anticipate.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Preparation, a pull or a push failed; a human has to look at the log.
    #[error("manual intervention required for {repository} in {}: {reason}", work_dir.display())]
    ManualIntervention {
        repository: String,
        work_dir: PathBuf,
        reason: String,
        /// Full command transcript of the attempt.
        log: String,
    },

    /// The command could not be started at all (executable missing, bad cwd).
    #[error("failed to launch `{program}` in {}: {source}", work_dir.display())]
    Spawn {
        program: String,
        work_dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A launch or I/O error cut the attempt short; the log so far is kept.
    #[error("sync of {repository} aborted: {source}")]
    Aborted {
        repository: String,
        work_dir: PathBuf,
        #[source]
        source: Box<SyncError>,
        log: String,
    },

    #[error("refusing to run an empty command line")]
    EmptyCommand,

    /// The worker runtime for parallel batches could not be built.
    #[error("failed to start worker runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Log transcript carried by the error, if any.
    pub fn log(&self) -> Option<&str> {
        match self {
            SyncError::ManualIntervention { log, .. } | SyncError::Aborted { log, .. } => Some(log),
            _ => None,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
