//! Template context: the serializable view of a batch's failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gitsync_engine::FailureEntry;

use crate::error::ReportError;

/// Rendering payload for `subject.tera` and `body.tera`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportContext {
    pub failures: Vec<FailureCtx>,
    pub count: usize,
    /// RFC 3339 timestamp.
    pub generated_at: String,
}

/// One failed repository, with paths flattened to strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureCtx {
    pub repository: String,
    pub work_dir: String,
    /// `manual intervention` or `unexpected`.
    pub kind: String,
    pub message: String,
    pub log: Option<String>,
    pub archived_log: Option<String>,
}

impl From<&FailureEntry> for FailureCtx {
    fn from(entry: &FailureEntry) -> Self {
        Self {
            repository: entry.repository.clone(),
            work_dir: entry.work_dir.display().to_string(),
            kind: entry.kind.to_string(),
            message: entry.message.clone(),
            log: entry.log.clone(),
            archived_log: entry.archived_log.as_ref().map(|p| p.display().to_string()),
        }
    }
}

impl ReportContext {
    pub fn from_failures(failures: &[FailureEntry], generated_at: DateTime<Utc>) -> Self {
        Self {
            failures: failures.iter().map(FailureCtx::from).collect(),
            count: failures.len(),
            generated_at: generated_at.to_rfc3339(),
        }
    }

    /// Convert into a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, ReportError> {
        tera::Context::from_serialize(self).map_err(ReportError::from)
    }
}
