//! Typed git invocations on top of a [`CommandRunner`].
//!
//! Remotes are registered under their position in the configuration
//! ("0", "1", …) so renaming a url never orphans a remote.

use std::path::Path;

use gitsync_core::GitSettings;

use crate::error::SyncError;
use crate::log::SyncLog;
use crate::runner::{CommandRunner, CommandStatus, ProcessRunner};

/// Local remote name for the remote at `index`.
pub fn remote_name(index: usize) -> String {
    index.to_string()
}

/// Git command builder bound to a runner and an executable.
#[derive(Debug, Clone)]
pub struct Git<R> {
    runner: R,
    program: String,
}

impl Git<ProcessRunner> {
    /// Real git, configured from the `git:` settings block.
    pub fn from_settings(settings: &GitSettings) -> Self {
        Self::new(ProcessRunner::for_git(settings), settings.program.clone())
    }
}

impl<R: CommandRunner> Git<R> {
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn exec(
        &self,
        args: &[&str],
        work_dir: &Path,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        let mut tokens = Vec::with_capacity(args.len() + 1);
        tokens.push(self.program.clone());
        tokens.extend(args.iter().map(|a| a.to_string()));
        self.runner.run(&tokens, work_dir, log)
    }

    pub fn init(
        &self,
        work_dir: &Path,
        branch: &str,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        let initial = format!("--initial-branch={branch}");
        self.exec(&["init", &initial], work_dir, log)
    }

    pub fn set_credential_user(
        &self,
        work_dir: &Path,
        user: &str,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        self.exec(&["config", "credential.username", user], work_dir, log)
    }

    pub fn remote_add(
        &self,
        work_dir: &Path,
        index: usize,
        url: &str,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        self.exec(&["remote", "add", &remote_name(index), url], work_dir, log)
    }

    pub fn remote_set_url(
        &self,
        work_dir: &Path,
        index: usize,
        url: &str,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        self.exec(&["remote", "set-url", &remote_name(index), url], work_dir, log)
    }

    /// `true` when the repository has at least one commit.
    pub fn has_head(&self, work_dir: &Path, log: &mut SyncLog) -> Result<bool, SyncError> {
        let status = self.exec(&["rev-parse", "--verify", "--quiet", "HEAD"], work_dir, log)?;
        Ok(status.success())
    }

    pub fn reset_hard(
        &self,
        work_dir: &Path,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        self.exec(&["reset", "--hard"], work_dir, log)
    }

    pub fn pull(
        &self,
        work_dir: &Path,
        index: usize,
        branch: &str,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        let remote = remote_name(index);
        self.exec(
            &["pull", "--progress", "--no-rebase", "--no-edit", &remote, branch],
            work_dir,
            log,
        )
    }

    pub fn push(
        &self,
        work_dir: &Path,
        index: usize,
        branch: &str,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        let remote = remote_name(index);
        self.exec(&["push", "--progress", &remote, branch], work_dir, log)
    }
}
