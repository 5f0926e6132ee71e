//! Command execution.
//!
//! [`CommandRunner`] is the seam between the engine and the outside world:
//! [`ProcessRunner`] spawns real processes, tests plug in a scripted fake.

use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use gitsync_core::GitSettings;

use crate::error::{io_err, SyncError};
use crate::log::SyncLog;

/// Interval between exit checks while a timed command runs.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// How a command ended. A non-zero exit is a value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Non-zero exit; `code` is `None` when killed by a signal.
    Failed { code: Option<i32> },
    TimedOut { after: Duration },
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        matches!(self, CommandStatus::Success)
    }

    fn from_exit(status: ExitStatus) -> Self {
        if status.success() {
            CommandStatus::Success
        } else {
            CommandStatus::Failed {
                code: status.code(),
            }
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Success => f.write_str("0"),
            CommandStatus::Failed { code: Some(code) } => write!(f, "{code}"),
            CommandStatus::Failed { code: None } => f.write_str("signal"),
            CommandStatus::TimedOut { after } => write!(f, "timed out after {after:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Runner trait
// ---------------------------------------------------------------------------

/// Run one command line in `work_dir`, recording it and its output in `log`.
///
/// `Err` only when the command could not be launched or the log could not be
/// written; every exit, zero or not, is `Ok`.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        tokens: &[String],
        work_dir: &Path,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError>;
}

// ---------------------------------------------------------------------------
// ProcessRunner
// ---------------------------------------------------------------------------

/// Spawns real child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    envs: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            envs: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            timeout: None,
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable for every child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runner configured from the `git:` settings block.
    pub fn for_git(settings: &GitSettings) -> Self {
        let mut runner =
            Self::new().timeout(settings.command_timeout_secs.map(Duration::from_secs));
        if let Some(identity) = &settings.identity {
            runner = runner
                .env("GIT_AUTHOR_NAME", &identity.name)
                .env("GIT_AUTHOR_EMAIL", &identity.email)
                .env("GIT_COMMITTER_NAME", &identity.name)
                .env("GIT_COMMITTER_EMAIL", &identity.email);
        }
        runner
    }

    fn wait(
        &self,
        child: &mut std::process::Child,
        log: &SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        let Some(limit) = self.timeout else {
            let status = child.wait().map_err(|e| io_err(log.path(), e))?;
            return Ok(CommandStatus::from_exit(status));
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(|e| io_err(log.path(), e))? {
                return Ok(CommandStatus::from_exit(status));
            }
            if started.elapsed() >= limit {
                // The child may exit between try_wait and kill.
                let _ = child.kill();
                child.wait().map_err(|e| io_err(log.path(), e))?;
                return Ok(CommandStatus::TimedOut { after: limit });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        tokens: &[String],
        work_dir: &Path,
        log: &mut SyncLog,
    ) -> Result<CommandStatus, SyncError> {
        let (program, args) = tokens.split_first().ok_or(SyncError::EmptyCommand)?;
        log.record_command(tokens)?;

        let (stdout, stderr) = log.child_stdio()?;
        let mut child = Command::new(program)
            .args(args)
            .current_dir(work_dir)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| SyncError::Spawn {
                program: program.clone(),
                work_dir: work_dir.to_path_buf(),
                source,
            })?;

        let status = self.wait(&mut child, log)?;
        log.record_status(&status)?;
        tracing::debug!(command = %tokens.join(" "), dir = %work_dir.display(), %status, "command finished");
        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
