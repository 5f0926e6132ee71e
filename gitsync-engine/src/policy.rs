//! Pull-all-then-push-all across every remote.
//!
//! Every remote is pulled, in order, whatever happened to the previous pull;
//! then every remote is pushed. A remote that rejected its pull still gets a
//! push, so the outcomes always cover `2 * remotes.len()` attempts.

use std::fmt;
use std::path::Path;

use gitsync_core::Remote;

use crate::error::SyncError;
use crate::git::{remote_name, Git};
use crate::log::SyncLog;
use crate::runner::{CommandRunner, CommandStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Pull,
    Push,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Pull => f.write_str("pull"),
            Direction::Push => f.write_str("push"),
        }
    }
}

/// Result of one pull or push against one remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutcome {
    pub index: usize,
    pub url: String,
    pub direction: Direction,
    pub status: CommandStatus,
}

impl RemoteOutcome {
    /// `pull from 1 (https://b/demo.git): exit 1`
    pub fn describe(&self) -> String {
        let preposition = match self.direction {
            Direction::Pull => "from",
            Direction::Push => "to",
        };
        let verdict = match self.status {
            CommandStatus::TimedOut { .. } => self.status.to_string(),
            status => format!("exit {status}"),
        };
        format!(
            "{} {preposition} {} ({}): {verdict}",
            self.direction,
            remote_name(self.index),
            self.url,
        )
    }
}

/// Every pull and push outcome of one repository, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSyncReport {
    pub outcomes: Vec<RemoteOutcome>,
}

impl RemoteSyncReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RemoteOutcome> {
        self.outcomes.iter().filter(|o| !o.status.success())
    }

    pub fn count(&self, direction: Direction) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.direction == direction)
            .count()
    }
}

/// Pull from every remote, then push to every remote.
pub fn sync_remotes<R: CommandRunner>(
    git: &Git<R>,
    remotes: &[Remote],
    work_dir: &Path,
    branch: &str,
    log: &mut SyncLog,
) -> Result<RemoteSyncReport, SyncError> {
    let mut report = RemoteSyncReport::default();

    for direction in [Direction::Pull, Direction::Push] {
        for (index, remote) in remotes.iter().enumerate() {
            let mut status = git.set_credential_user(work_dir, &remote.user, log)?;
            if status.success() {
                status = match direction {
                    Direction::Pull => git.pull(work_dir, index, branch, log)?,
                    Direction::Push => git.push(work_dir, index, branch, log)?,
                };
            } else {
                log.note(format!(
                    "credential setup for remote {} failed; {direction} skipped",
                    remote_name(index)
                ))?;
            }
            if !status.success() {
                tracing::warn!(remote = index, url = %remote.url, %direction, %status, "remote operation failed");
            }
            report.outcomes.push(RemoteOutcome {
                index,
                url: remote.url.clone(),
                direction,
                status,
            });
        }
    }
    Ok(report)
}
