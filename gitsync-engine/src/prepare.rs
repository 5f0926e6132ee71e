//! Local mirror preparation.
//!
//! Brings `<work_dir>/<name>` to a state where pulls and pushes can run:
//!
//! ```text
//! absent          -> mkdir -p, init, register every remote
//! dir, no .git    -> init in place, register every remote
//! git repository  -> reconcile remote urls, reset local drift
//! ```
//!
//! Every step is safe to repeat, so an interrupted run is resumed by the next.

use std::path::Path;

use gitsync_core::Remote;

use crate::error::{io_err, SyncError};
use crate::git::{remote_name, Git};
use crate::log::SyncLog;
use crate::runner::CommandRunner;

/// What preparation did to the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    /// A new repository was initialized.
    Initialized,
    /// An existing repository was reconciled.
    Resumed,
    /// A step failed; the log says which.
    Failed,
}

impl Preparation {
    pub fn is_failed(&self) -> bool {
        matches!(self, Preparation::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareOptions {
    /// Initial branch for `git init`.
    pub branch: String,
    pub reset_local_changes: bool,
}

/// Prepare `work_dir` for syncing against `remotes`.
pub fn prepare<R: CommandRunner>(
    git: &Git<R>,
    remotes: &[Remote],
    work_dir: &Path,
    options: &PrepareOptions,
    log: &mut SyncLog,
) -> Result<Preparation, SyncError> {
    if !work_dir.exists() {
        std::fs::create_dir_all(work_dir).map_err(|e| io_err(work_dir, e))?;
        log.note(format!("created {}", work_dir.display()))?;
        return initialize(git, remotes, work_dir, &options.branch, log);
    }

    if !work_dir.join(".git").exists() {
        log.note("directory exists but is not a git repository; initializing in place")?;
        return initialize(git, remotes, work_dir, &options.branch, log);
    }

    resume(git, remotes, work_dir, options, log)
}

fn initialize<R: CommandRunner>(
    git: &Git<R>,
    remotes: &[Remote],
    work_dir: &Path,
    branch: &str,
    log: &mut SyncLog,
) -> Result<Preparation, SyncError> {
    if !git.init(work_dir, branch, log)?.success() {
        return Ok(Preparation::Failed);
    }
    for (index, remote) in remotes.iter().enumerate() {
        if !register(git, work_dir, index, remote, log)? {
            return Ok(Preparation::Failed);
        }
    }
    Ok(Preparation::Initialized)
}

fn register<R: CommandRunner>(
    git: &Git<R>,
    work_dir: &Path,
    index: usize,
    remote: &Remote,
    log: &mut SyncLog,
) -> Result<bool, SyncError> {
    if !git.set_credential_user(work_dir, &remote.user, log)?.success() {
        return Ok(false);
    }
    Ok(git.remote_add(work_dir, index, &remote.url, log)?.success())
}

fn resume<R: CommandRunner>(
    git: &Git<R>,
    remotes: &[Remote],
    work_dir: &Path,
    options: &PrepareOptions,
    log: &mut SyncLog,
) -> Result<Preparation, SyncError> {
    for (index, remote) in remotes.iter().enumerate() {
        if git.remote_set_url(work_dir, index, &remote.url, log)?.success() {
            continue;
        }
        log.note(format!("remote {} missing; registering it", remote_name(index)))?;
        if !register(git, work_dir, index, remote, log)? {
            return Ok(Preparation::Failed);
        }
    }

    if options.reset_local_changes {
        if git.has_head(work_dir, log)? {
            if !git.reset_hard(work_dir, log)?.success() {
                return Ok(Preparation::Failed);
            }
        } else {
            log.note("no commits yet; nothing to reset")?;
        }
    }
    Ok(Preparation::Resumed)
}
