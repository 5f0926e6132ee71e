use std::path::PathBuf;

use gitsync_core::{ReportConfig, Settings};
use gitsync_engine::{FailureEntry, FailureKind, Reporter};
use gitsync_report::{Notifier, ReportRenderer, Transport};
use tempfile::TempDir;

fn settings(templates_dir: Option<PathBuf>) -> Settings {
    Settings {
        work_dir: PathBuf::from("/srv/sync"),
        default_branch: "master".into(),
        log_dir: None,
        templates_dir,
        git: Default::default(),
        report: ReportConfig::None,
    }
}

fn failures() -> Vec<FailureEntry> {
    vec![
        FailureEntry {
            repository: "alpha".into(),
            work_dir: PathBuf::from("/srv/sync/alpha"),
            kind: FailureKind::ManualIntervention,
            message: "manual intervention required for alpha in /srv/sync/alpha: pull from 1 (B): exit 1"
                .into(),
            log: Some("=== syncing alpha in /srv/sync/alpha ===\n> git pull --progress --no-rebase --no-edit 1 master\n| Return code: 1\n".into()),
            archived_log: Some(PathBuf::from("/var/log/gitsync/alpha.log")),
        },
        FailureEntry {
            repository: "beta".into(),
            work_dir: PathBuf::from("/srv/sync/beta"),
            kind: FailureKind::Unexpected,
            message: "failed to launch `git` in /srv/sync/beta: No such file or directory".into(),
            log: None,
            archived_log: None,
        },
    ]
}

#[test]
fn composed_report_covers_every_failure() {
    let notifier = Notifier::from_settings(&settings(None)).unwrap();

    let payload = notifier.compose(&failures()).unwrap();

    assert_eq!(payload.subject, "Error during git-sync for 2 repositories");
    assert!(payload.body.contains("Manual intervention required for alpha in /srv/sync/alpha."));
    assert!(payload.body.contains("Manual intervention required for beta in /srv/sync/beta."));
    assert!(payload.body.contains("=== beta (unexpected) ==="));
    assert!(payload.body.contains("| Return code: 1"));
    assert!(payload.body.contains("Archived log: /var/log/gitsync/alpha.log"));

    let attachment = payload.attachment.unwrap();
    assert!(attachment.content.contains("=== alpha ==="));
    assert!(!attachment.content.contains("=== beta ==="));
}

#[test]
fn no_report_transport_accepts_delivery() {
    let notifier = Notifier::from_settings(&settings(None)).unwrap();
    assert_eq!(notifier.transport(), &Transport::NoReport);
    notifier.report(&failures()).unwrap();
}

#[test]
fn templates_dir_from_settings_is_honoured() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("body.tera"),
        "{% for f in failures %}{{ f.repository }};{% endfor %}",
    )
    .unwrap();

    let notifier = Notifier::from_settings(&settings(Some(dir.path().to_path_buf()))).unwrap();
    let payload = notifier.compose(&failures()).unwrap();

    assert_eq!(payload.body, "alpha;beta;");
    assert_eq!(payload.subject, "Error during git-sync for 2 repositories");
}

#[test]
fn explicit_construction_matches_settings() {
    let notifier = Notifier::new(ReportRenderer::embedded().unwrap(), Transport::NoReport);
    let payload = notifier.compose(&failures()[..1]).unwrap();
    assert_eq!(payload.subject, "Error during git-sync for alpha");
}
