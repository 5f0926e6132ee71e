//! One repository, start to finish: fresh log, prepare, pull/push, verdict.

use std::path::{Path, PathBuf};

use gitsync_core::{RepositoryConfig, Settings, DEFAULT_BRANCH};

use crate::error::SyncError;
use crate::git::Git;
use crate::log::SyncLog;
use crate::policy::{sync_remotes, RemoteSyncReport};
use crate::prepare::{prepare, PrepareOptions, Preparation};
use crate::runner::CommandRunner;

/// Batch-wide knobs for a single repository attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Branch for repositories that do not name one.
    pub default_branch: String,
    pub reset_local_changes: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_BRANCH.to_string(),
            reset_local_changes: true,
        }
    }
}

impl SyncOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            default_branch: settings.default_branch.clone(),
            reset_local_changes: settings.git.reset_local_changes,
        }
    }
}

/// A repository that synced cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySync {
    pub repository: String,
    pub work_dir: PathBuf,
    pub preparation: Preparation,
    pub remotes: RemoteSyncReport,
}

/// Sync `repo` inside `work_dir`.
///
/// The [`SyncLog`] lives for exactly this call; on failure its contents
/// travel inside [`SyncError::ManualIntervention`], or [`SyncError::Aborted`]
/// when a command could not be launched or the log could not be written.
pub fn sync_repository<R: CommandRunner>(
    git: &Git<R>,
    repo: &RepositoryConfig,
    work_dir: &Path,
    options: &SyncOptions,
) -> Result<RepositorySync, SyncError> {
    tracing::info!(repository = repo.name.as_str(), dir = %work_dir.display(), "syncing");

    let mut log = SyncLog::new()?;
    sync_with_log(git, repo, work_dir, options, &mut log).map_err(|err| match err {
        err @ (SyncError::Spawn { .. } | SyncError::Io { .. } | SyncError::EmptyCommand) => {
            match log.contents() {
                Ok(text) => SyncError::Aborted {
                    repository: repo.name.0.clone(),
                    work_dir: work_dir.to_path_buf(),
                    source: Box::new(err),
                    log: text,
                },
                Err(_) => err,
            }
        }
        other => other,
    })
}

fn sync_with_log<R: CommandRunner>(
    git: &Git<R>,
    repo: &RepositoryConfig,
    work_dir: &Path,
    options: &SyncOptions,
    log: &mut SyncLog,
) -> Result<RepositorySync, SyncError> {
    let name = repo.name.as_str();
    let branch = repo.branch_or(&options.default_branch);
    log.section(name, work_dir)?;

    let prepare_options = PrepareOptions {
        branch: branch.to_string(),
        reset_local_changes: options.reset_local_changes,
    };
    let preparation = prepare(git, &repo.remotes, work_dir, &prepare_options, log)?;
    if preparation.is_failed() {
        return Err(manual_intervention(name, work_dir, "preparation failed".into(), log)?);
    }

    let remotes = sync_remotes(git, &repo.remotes, work_dir, branch, log)?;
    if !remotes.succeeded() {
        let reason = remotes
            .failures()
            .map(|o| o.describe())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(manual_intervention(name, work_dir, reason, log)?);
    }

    tracing::info!(repository = name, ?preparation, "synced");
    Ok(RepositorySync {
        repository: name.to_string(),
        work_dir: work_dir.to_path_buf(),
        preparation,
        remotes,
    })
}

fn manual_intervention(
    repository: &str,
    work_dir: &Path,
    reason: String,
    log: &SyncLog,
) -> Result<SyncError, SyncError> {
    Ok(SyncError::ManualIntervention {
        repository: repository.to_string(),
        work_dir: work_dir.to_path_buf(),
        reason,
        log: log.contents()?,
    })
}
