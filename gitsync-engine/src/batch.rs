//! Batch runner: every configured repository, failures isolated, one report.
//!
//! ```text
//! for each repository           (sequential, or bounded pool when jobs > 1)
//!     sync_repository(base/name)
//!     Err(_) -> FailureEntry (+ archived log when log_dir is set)
//! failures non-empty -> reporter.report(all failures)   exactly once
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gitsync_core::RepositoryConfig;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::archive::{archive_log, MAX_ARCHIVED_LOGS};
use crate::error::SyncError;
use crate::git::Git;
use crate::repository::{sync_repository, RepositorySync, SyncOptions};
use crate::runner::CommandRunner;

// ---------------------------------------------------------------------------
// Failure entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Preparation, a pull or a push failed.
    ManualIntervention,
    /// Launch failure, I/O error or a panicked task.
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ManualIntervention => f.write_str("manual intervention"),
            FailureKind::Unexpected => f.write_str("unexpected"),
        }
    }
}

/// One failed repository, as handed to the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    pub repository: String,
    pub work_dir: PathBuf,
    pub kind: FailureKind,
    pub message: String,
    pub log: Option<String>,
    pub archived_log: Option<PathBuf>,
}

impl FailureEntry {
    pub fn from_error(repository: &str, work_dir: &Path, err: SyncError) -> Self {
        let kind = match err {
            SyncError::ManualIntervention { .. } => FailureKind::ManualIntervention,
            _ => FailureKind::Unexpected,
        };
        let message = err.to_string();
        let log = match err {
            SyncError::ManualIntervention { log, .. } | SyncError::Aborted { log, .. } => Some(log),
            _ => None,
        };
        Self {
            repository: repository.to_string(),
            work_dir: work_dir.to_path_buf(),
            kind,
            message,
            log,
            archived_log: None,
        }
    }

    fn unexpected(repository: &str, work_dir: &Path, message: String) -> Self {
        Self {
            repository: repository.to_string(),
            work_dir: work_dir.to_path_buf(),
            kind: FailureKind::Unexpected,
            message,
            log: None,
            archived_log: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reporter seam
// ---------------------------------------------------------------------------

/// Receives every failure of a batch in a single call.
pub trait Reporter {
    type Error: fmt::Display;

    fn report(&self, failures: &[FailureEntry]) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// Options and outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub sync: SyncOptions,
    /// Where failure logs are archived; `None` disables archiving.
    pub log_dir: Option<PathBuf>,
    /// Repositories synced concurrently; `0` and `1` both mean sequential.
    pub jobs: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            sync: SyncOptions::default(),
            log_dir: None,
            jobs: 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub synced: Vec<RepositorySync>,
    pub failures: Vec<FailureEntry>,
    /// The reporter accepted the failures.
    pub reported: bool,
    /// Why the reporter did not accept them.
    pub report_error: Option<String>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// `0` when every repository synced, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_clean() {
            0
        } else {
            1
        }
    }

    fn push(&mut self, result: Result<RepositorySync, FailureEntry>) {
        match result {
            Ok(done) => self.synced.push(done),
            Err(entry) => self.failures.push(entry),
        }
    }
}

// ---------------------------------------------------------------------------
// Runners
// ---------------------------------------------------------------------------

/// Attempt one repository and turn any error into a [`FailureEntry`].
fn attempt<R: CommandRunner>(
    git: &Git<R>,
    repo: &RepositoryConfig,
    base: &Path,
    options: &BatchOptions,
) -> Result<RepositorySync, FailureEntry> {
    let name = repo.name.as_str();
    let work_dir = repo.work_dir(base);

    sync_repository(git, repo, &work_dir, &options.sync).map_err(|err| {
        let mut entry = FailureEntry::from_error(name, &work_dir, err);
        match entry.kind {
            FailureKind::ManualIntervention => tracing::error!(
                repository = name,
                "manual intervention required for {name} in {}",
                work_dir.display()
            ),
            FailureKind::Unexpected => {
                tracing::error!(repository = name, error = %entry.message, "sync aborted")
            }
        }

        if let (Some(dir), Some(log)) = (&options.log_dir, &entry.log) {
            match archive_log(dir, name, log, MAX_ARCHIVED_LOGS) {
                Ok(path) => entry.archived_log = Some(path),
                Err(err) => {
                    tracing::warn!(repository = name, dir = %dir.display(), error = %err, "could not archive log")
                }
            }
        }
        entry
    })
}

/// Sync every repository one after another.
///
/// A panic inside one attempt becomes an unexpected failure for that
/// repository; the remaining repositories still run.
pub fn sync_all<R: CommandRunner>(
    git: &Git<R>,
    repositories: &[RepositoryConfig],
    base: &Path,
    options: &BatchOptions,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for repo in repositories {
        let result = panic::catch_unwind(AssertUnwindSafe(|| attempt(git, repo, base, options)))
            .unwrap_or_else(|payload| {
                let name = repo.name.as_str();
                let reason = panic_message(payload.as_ref());
                tracing::error!(repository = name, error = %reason, "sync task panicked");
                Err(FailureEntry::unexpected(
                    name,
                    &repo.work_dir(base),
                    format!("sync task for {name} panicked: {reason}"),
                ))
            });
        outcome.push(result);
    }
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "non-string panic payload"
    }
}

/// Sync repositories on a bounded pool of blocking tasks.
///
/// Each repository's commands stay ordered; only repositories overlap.
/// Results come back in configuration order.
pub fn sync_all_parallel<R: CommandRunner + 'static>(
    git: Arc<Git<R>>,
    repositories: &[RepositoryConfig],
    base: &Path,
    options: &BatchOptions,
) -> Result<BatchOutcome, SyncError> {
    let jobs = options.jobs.max(1);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(jobs.min(4))
        .max_blocking_threads(jobs)
        .enable_all()
        .build()
        .map_err(SyncError::Runtime)?;

    let mut slots: Vec<Option<Result<RepositorySync, FailureEntry>>> =
        repositories.iter().map(|_| None).collect();

    runtime.block_on(async {
        let semaphore = Arc::new(Semaphore::new(jobs));
        let mut set = JoinSet::new();

        for (index, repo) in repositories.iter().cloned().enumerate() {
            let git = Arc::clone(&git);
            let semaphore = Arc::clone(&semaphore);
            let base = base.to_path_buf();
            let options = options.clone();

            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let name = repo.name.0.clone();
                let work_dir = repo.work_dir(&base);
                let joined =
                    tokio::task::spawn_blocking(move || attempt(&*git, &repo, &base, &options))
                        .await;
                let result = joined.unwrap_or_else(|err| {
                    tracing::error!(repository = %name, error = %err, "sync task failed");
                    Err(FailureEntry::unexpected(
                        &name,
                        &work_dir,
                        format!("sync task for {name} failed: {err}"),
                    ))
                });
                (index, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(err) => tracing::error!(error = %err, "sync task lost"),
            }
        }
    });

    let mut outcome = BatchOutcome::default();
    for (slot, repo) in slots.into_iter().zip(repositories) {
        let result = slot.unwrap_or_else(|| {
            let name = repo.name.as_str();
            Err(FailureEntry::unexpected(
                name,
                &repo.work_dir(base),
                format!("sync task for {name} did not complete"),
            ))
        });
        outcome.push(result);
    }
    Ok(outcome)
}

/// Sync everything, then hand the failures to `reporter` once.
pub fn run<R, P>(
    git: Arc<Git<R>>,
    repositories: &[RepositoryConfig],
    base: &Path,
    options: &BatchOptions,
    reporter: &P,
) -> Result<BatchOutcome, SyncError>
where
    R: CommandRunner + 'static,
    P: Reporter,
{
    tracing::info!(
        repositories = repositories.len(),
        jobs = options.jobs.max(1),
        "starting batch"
    );
    let mut outcome = if options.jobs > 1 && repositories.len() > 1 {
        sync_all_parallel(git, repositories, base, options)?
    } else {
        sync_all(&*git, repositories, base, options)
    };

    if !outcome.failures.is_empty() {
        match reporter.report(&outcome.failures) {
            Ok(()) => outcome.reported = true,
            Err(err) => {
                tracing::error!(error = %err, "failed to deliver failure report");
                outcome.report_error = Some(err.to_string());
            }
        }
    }

    tracing::info!(
        synced = outcome.synced.len(),
        failed = outcome.failures.len(),
        "batch finished"
    );
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
