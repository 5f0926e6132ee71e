//! Domain types for gitsync configuration.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are deserializable via serde + serde_yaml.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Branch used when neither the repository nor the settings name one.
pub const DEFAULT_BRANCH: &str = "master";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a synchronized repository.
///
/// Doubles as the directory name below the settings' `work_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryName(pub String);

impl RepositoryName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepositoryName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepositoryName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Repository files
// ---------------------------------------------------------------------------

/// One push/pull target and the credential identity presented to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub url: String,
    pub user: String,
}

/// One logical repository kept in sync across its remotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: RepositoryName,
    /// Ordered; the position becomes the local remote name ("0", "1", …).
    #[serde(default)]
    pub remotes: Vec<Remote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl RepositoryConfig {
    /// `<base>/<name>`: the local mirror for this repository.
    pub fn work_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.name.0)
    }

    /// The branch to pull and push, falling back to `default`.
    pub fn branch_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.branch.as_deref().unwrap_or(default)
    }
}

/// Root of a repository YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RepositoryFile {
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

/// Author/committer identity exported to git for merge commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// How the git executable is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSettings {
    #[serde(default = "default_git_program")]
    pub program: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
    /// Run `git reset --hard` on existing mirrors before pulling.
    #[serde(default = "default_true")]
    pub reset_local_changes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            program: default_git_program(),
            command_timeout_secs: None,
            reset_local_changes: true,
            identity: None,
        }
    }
}

/// SMTP delivery parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub to: String,
    pub from: String,
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Name of an environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
    #[serde(default = "default_true")]
    pub starttls: bool,
}

/// Which transport delivers failure reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum ReportConfig {
    #[default]
    None,
    /// Local `mail` command.
    Mail {
        to: String,
        #[serde(default = "default_mail_command")]
        command: String,
    },
    Smtp(SmtpConfig),
}

impl ReportConfig {
    pub fn transport_name(&self) -> &'static str {
        match self {
            ReportConfig::None => "none",
            ReportConfig::Mail { .. } => "mail",
            ReportConfig::Smtp(_) => "smtp",
        }
    }
}

/// Root of the settings YAML file (`config.yml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base directory holding one mirror per repository.
    pub work_dir: PathBuf,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    #[serde(default)]
    pub git: GitSettings,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Everything one invocation needs: settings plus the merged repository list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub settings: Settings,
    pub repositories: Vec<RepositoryConfig>,
}

impl BatchConfig {
    pub fn remote_count(&self) -> usize {
        self.repositories.iter().map(|r| r.remotes.len()).sum()
    }
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_mail_command() -> String {
    "mail".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(RepositoryName::from("demo").to_string(), "demo");
    }

    #[test]
    fn work_dir_joins_name() {
        let repo = RepositoryConfig {
            name: RepositoryName::from("demo"),
            remotes: vec![],
            branch: None,
        };
        assert_eq!(repo.work_dir(Path::new("/srv/sync")), PathBuf::from("/srv/sync/demo"));
    }

    #[test]
    fn branch_falls_back_to_default() {
        let mut repo = RepositoryConfig {
            name: RepositoryName::from("demo"),
            remotes: vec![],
            branch: None,
        };
        assert_eq!(repo.branch_or("master"), "master");
        repo.branch = Some("main".into());
        assert_eq!(repo.branch_or("master"), "main");
    }

    #[test]
    fn settings_defaults_fill_in() {
        let settings: Settings = serde_yaml::from_str("work_dir: /tmp/sync\n").expect("parse");
        assert_eq!(settings.default_branch, "master");
        assert_eq!(settings.git.program, "git");
        assert!(settings.git.reset_local_changes);
        assert_eq!(settings.report, ReportConfig::None);
    }

    #[test]
    fn report_config_is_tagged_by_transport() {
        let yaml = "transport: smtp\nto: ops@example.com\nfrom: sync@example.com\nhost: mail.example.com\n";
        let report: ReportConfig = serde_yaml::from_str(yaml).expect("parse");
        match report {
            ReportConfig::Smtp(smtp) => {
                assert_eq!(smtp.port, 587);
                assert!(smtp.starttls);
                assert_eq!(smtp.host, "mail.example.com");
            }
            other => panic!("expected smtp, got {other:?}"),
        }

        let mail: ReportConfig =
            serde_yaml::from_str("transport: mail\nto: ops@example.com\n").expect("parse");
        assert_eq!(
            mail,
            ReportConfig::Mail {
                to: "ops@example.com".into(),
                command: "mail".into()
            }
        );
        assert_eq!(mail.transport_name(), "mail");
    }
}
