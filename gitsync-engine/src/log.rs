//! Per-attempt command transcript.
//!
//! A [`SyncLog`] is backed by a temporary file (`git-sync-log-*.txt`) so child
//! processes can write their stdout and stderr straight into it, interleaved
//! in the order they were produced. The file is removed when the log drops.
//!
//! Line markers:
//!
//! ```text
//! === syncing <repo> in <dir> ===     section header
//! > git pull --progress ... 0 master  command about to run
//! | Return code: 1                    how it ended
//! # note                              engine remark
//! ```

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use tempfile::NamedTempFile;

use crate::error::{io_err, SyncError};
use crate::runner::CommandStatus;

/// Append-only transcript owned by one sync attempt.
#[derive(Debug)]
pub struct SyncLog {
    file: NamedTempFile,
}

impl SyncLog {
    pub fn new() -> Result<Self, SyncError> {
        let file = tempfile::Builder::new()
            .prefix("git-sync-log-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| io_err(std::env::temp_dir(), e))?;
        Ok(Self { file })
    }

    /// Location of the backing file while the attempt is running.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Append one line and flush it.
    pub fn line(&mut self, text: impl fmt::Display) -> Result<(), SyncError> {
        writeln!(self.file, "{text}").map_err(|e| io_err(self.file.path(), e))?;
        self.file.flush().map_err(|e| io_err(self.file.path(), e))
    }

    pub fn section(&mut self, repository: &str, work_dir: &Path) -> Result<(), SyncError> {
        self.line(format!("=== syncing {repository} in {} ===", work_dir.display()))
    }

    pub fn note(&mut self, text: impl fmt::Display) -> Result<(), SyncError> {
        self.line(format!("# {text}"))
    }

    pub fn record_command(&mut self, tokens: &[String]) -> Result<(), SyncError> {
        self.line(format!("> {}", tokens.join(" ")))
    }

    pub fn record_status(&mut self, status: &CommandStatus) -> Result<(), SyncError> {
        match status {
            CommandStatus::TimedOut { after } => {
                self.line(format!("| Timed out after {after:?}"))
            }
            other => self.line(format!("| Return code: {other}")),
        }
    }

    /// Two handles on the backing file for a child's stdout and stderr.
    ///
    /// Both share the file offset with the log, so output lands after the
    /// last line written and before the next one.
    pub(crate) fn child_stdio(&self) -> Result<(Stdio, Stdio), SyncError> {
        let out = self
            .file
            .as_file()
            .try_clone()
            .map_err(|e| io_err(self.file.path(), e))?;
        let err = out.try_clone().map_err(|e| io_err(self.file.path(), e))?;
        Ok((Stdio::from(out), Stdio::from(err)))
    }

    /// Everything recorded so far, read from the start of the file.
    ///
    /// Reads through the path, so the shared write offset is left alone.
    pub fn contents(&self) -> Result<String, SyncError> {
        let bytes = std::fs::read(self.file.path()).map_err(|e| io_err(self.file.path(), e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
