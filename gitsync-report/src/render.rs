//! Tera rendering of report subject and body.
//!
//! | Template      | Produces                     |
//! |---------------|------------------------------|
//! | `subject.tera`| mail subject (single line)   |
//! | `body.tera`   | plain-text mail body         |
//!
//! A `templates_dir` may hold files with the same names to replace either.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tera::Tera;

use gitsync_engine::FailureEntry;

use crate::context::ReportContext;
use crate::error::{io_err, ReportError};
use crate::payload::{build_attachment, ReportPayload};

pub const SUBJECT_TEMPLATE: &str = "subject.tera";
pub const BODY_TEMPLATE: &str = "body.tera";

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    (SUBJECT_TEMPLATE, include_str!("templates/subject.tera")),
    (BODY_TEMPLATE, include_str!("templates/body.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, ReportError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    let mut templates = Vec::new();
    for entry in entries {
        let path: PathBuf = entry.map_err(|e| io_err(dir, e))?.path();
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if !TPLS.iter().any(|(known, _)| *known == name) {
            continue;
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name.to_string(), contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, ReportError> {
    let mut templates: HashMap<String, String> = TPLS
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect();
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            tracing::debug!(template = %name, dir = %dir.display(), "using template override");
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(templates)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// ReportRenderer
// ---------------------------------------------------------------------------

/// Renders failure entries into a [`ReportPayload`].
///
/// Create once with [`ReportRenderer::new`] and reuse.
pub struct ReportRenderer {
    tera: Tera,
}

impl ReportRenderer {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, ReportError> {
        Ok(Self {
            tera: build_tera(user_template_dir)?,
        })
    }

    /// Embedded templates only.
    pub fn embedded() -> Result<Self, ReportError> {
        Self::new(None)
    }

    pub fn render(
        &self,
        failures: &[FailureEntry],
        generated_at: DateTime<Utc>,
    ) -> Result<ReportPayload, ReportError> {
        let ctx = ReportContext::from_failures(failures, generated_at).to_tera_context()?;
        let subject = self.tera.render(SUBJECT_TEMPLATE, &ctx)?;
        let body = self.tera.render(BODY_TEMPLATE, &ctx)?;
        Ok(ReportPayload {
            // Mail headers cannot hold newlines.
            subject: subject.lines().next().unwrap_or_default().trim().to_string(),
            body,
            attachment: build_attachment(failures, generated_at),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gitsync_engine::FailureKind;
    use tempfile::TempDir;

    fn failure(name: &str) -> FailureEntry {
        FailureEntry {
            repository: name.into(),
            work_dir: PathBuf::from("/srv/sync").join(name),
            kind: FailureKind::ManualIntervention,
            message: format!("manual intervention required for {name}"),
            log: Some(format!("=== syncing {name} ===\n> git pull\n| Return code: 1\n")),
            archived_log: None,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn single_failure_subject_names_repository() {
        let renderer = ReportRenderer::embedded().unwrap();
        let payload = renderer.render(&[failure("demo")], at()).unwrap();
        assert_eq!(payload.subject, "Error during git-sync for demo");
        assert!(payload
            .body
            .starts_with("Manual intervention required for demo in /srv/sync/demo."));
    }

    #[test]
    fn several_failures_subject_counts_them() {
        let renderer = ReportRenderer::embedded().unwrap();
        let payload = renderer
            .render(&[failure("a"), failure("b"), failure("c")], at())
            .unwrap();
        assert_eq!(payload.subject, "Error during git-sync for 3 repositories");
        for name in ["a", "b", "c"] {
            assert!(payload.body.contains(&format!("=== syncing {name} ===")));
        }
    }

    #[test]
    fn body_mentions_archived_log() {
        let mut entry = failure("demo");
        entry.archived_log = Some(PathBuf::from("/var/log/gitsync/demo.log"));
        let payload = ReportRenderer::embedded().unwrap().render(&[entry], at()).unwrap();
        assert!(payload.body.contains("Archived log: /var/log/gitsync/demo.log"));
    }

    #[test]
    fn attachment_included_when_logs_exist() {
        let payload = ReportRenderer::embedded()
            .unwrap()
            .render(&[failure("demo")], at())
            .unwrap();
        let attachment = payload.attachment.unwrap();
        assert_eq!(attachment.file_name, "git-sync-log-20240301-120000.txt");
        assert!(attachment.content.starts_with("=== demo ===\n"));
    }

    #[test]
    fn user_templates_override_embedded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("subject.tera"), "[sync] {{ count }} broken\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let renderer = ReportRenderer::new(Some(dir.path())).unwrap();
        let payload = renderer.render(&[failure("demo")], at()).unwrap();

        assert_eq!(payload.subject, "[sync] 1 broken");
        assert!(payload.body.contains("Manual intervention required for demo"));
    }

    #[test]
    fn missing_template_dir_falls_back() {
        let dir = TempDir::new().unwrap();
        let renderer = ReportRenderer::new(Some(&dir.path().join("absent"))).unwrap();
        let payload = renderer.render(&[failure("demo")], at()).unwrap();
        assert_eq!(payload.subject, "Error during git-sync for demo");
    }

    #[test]
    fn broken_override_is_a_tera_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("body.tera"), "{% if %}").unwrap();
        let err = ReportRenderer::new(Some(dir.path())).err().unwrap();
        assert!(matches!(err, ReportError::Tera(_)));
    }
}
