//! Scripted [`CommandRunner`] for unit tests.

use std::path::Path;
use std::sync::Mutex;

use gitsync_core::{Remote, RepositoryConfig, RepositoryName};

use crate::error::SyncError;
use crate::git::Git;
use crate::log::SyncLog;
use crate::runner::{CommandRunner, CommandStatus};

type Rule = Box<dyn Fn(&str, &Path) -> bool + Send + Sync>;

/// Records every command line and fails those matching a rule with exit 1.
///
/// Commands are compared without the program token, e.g. `"pull ... 1 master"`.
#[derive(Default)]
pub(crate) struct FakeRunner {
    calls: Mutex<Vec<(String, std::path::PathBuf)>>,
    failing: Vec<Rule>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail every command whose argument line equals `line`.
    pub(crate) fn fail_on(mut self, line: &str) -> Self {
        let line = line.to_string();
        self.failing.push(Box::new(move |cmd, _| cmd == line));
        self
    }

    /// Fail commands chosen by an arbitrary predicate.
    pub(crate) fn fail_when(
        mut self,
        rule: impl Fn(&str, &Path) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.failing.push(Box::new(rule));
        self
    }

    /// Argument lines in execution order.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(line, _)| line.clone())
            .collect()
    }

    /// Argument lines run inside `dir`.
    pub(crate) fn lines_in(&self, dir: &Path) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, d)| d == dir)
            .map(|(line, _)| line.clone())
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        tokens: &[String],
        work_dir: &Path,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        let line = tokens[1..].join(" ");
        log.record_command(tokens)?;
        self.calls
            .lock()
            .unwrap()
            .push((line.clone(), work_dir.to_path_buf()));

        let status = if self.failing.iter().any(|rule| rule(&line, work_dir)) {
            CommandStatus::Failed { code: Some(1) }
        } else {
            CommandStatus::Success
        };
        log.record_status(&status)?;
        Ok(status)
    }
}

pub(crate) fn fake_git(runner: FakeRunner) -> Git<FakeRunner> {
    Git::new(runner, "git")
}

pub(crate) fn remotes_ab() -> Vec<Remote> {
    vec![
        Remote {
            url: "A".into(),
            user: "u1".into(),
        },
        Remote {
            url: "B".into(),
            user: "u2".into(),
        },
    ]
}

pub(crate) fn repo(name: &str, remotes: Vec<Remote>) -> RepositoryConfig {
    RepositoryConfig {
        name: RepositoryName::from(name),
        remotes,
        branch: None,
    }
}
