//! Report payload: subject, body and the combined log attachment.

use chrono::{DateTime, Utc};

use gitsync_engine::FailureEntry;

/// A text file attached to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content: String,
}

/// Everything a transport needs to send one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPayload {
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

/// `git-sync-log-20240301-120000.txt`
pub fn attachment_name(at: DateTime<Utc>) -> String {
    format!("git-sync-log-{}.txt", at.format("%Y%m%d-%H%M%S"))
}

/// All failure logs, each under a `=== <repo> ===` header.
///
/// `None` when no failure carries a log.
pub fn build_attachment(failures: &[FailureEntry], at: DateTime<Utc>) -> Option<Attachment> {
    let mut content = String::new();
    for failure in failures {
        let Some(log) = &failure.log else { continue };
        if !content.is_empty() {
            content.push('\n');
        }
        content.push_str(&format!("=== {} ===\n", failure.repository));
        content.push_str(log);
        if !log.ends_with('\n') {
            content.push('\n');
        }
    }
    if content.is_empty() {
        return None;
    }
    Some(Attachment {
        file_name: attachment_name(at),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gitsync_engine::FailureKind;
    use std::path::PathBuf;

    fn entry(name: &str, log: Option<&str>) -> FailureEntry {
        FailureEntry {
            repository: name.into(),
            work_dir: PathBuf::from("/srv").join(name),
            kind: if log.is_some() {
                FailureKind::ManualIntervention
            } else {
                FailureKind::Unexpected
            },
            message: format!("{name} failed"),
            log: log.map(str::to_string),
            archived_log: None,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap()
    }

    #[test]
    fn name_carries_timestamp() {
        assert_eq!(attachment_name(at()), "git-sync-log-20240301-120005.txt");
    }

    #[test]
    fn logs_are_concatenated_under_headers() {
        let failures = [entry("a", Some("log a\n")), entry("b", None), entry("c", Some("log c"))];

        let attachment = build_attachment(&failures, at()).unwrap();

        assert_eq!(attachment.content, "=== a ===\nlog a\n\n=== c ===\nlog c\n");
    }

    #[test]
    fn no_logs_no_attachment() {
        assert!(build_attachment(&[entry("b", None)], at()).is_none());
    }
}
