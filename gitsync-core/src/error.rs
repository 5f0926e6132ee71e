//! Error types for gitsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the file that was being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A configuration file did not exist at the expected path.
    #[error("configuration file not found at {path}")]
    NotFound { path: PathBuf },

    /// No settings file was given and none of the default locations exist.
    #[error("no settings file found (looked in: {})", display_paths(.searched))]
    NoSettingsFile { searched: Vec<PathBuf> },

    /// `dirs::home_dir()` returned `None` while expanding `~`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("invalid repository name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("repository '{name}' is declared twice ({first} and {second})")]
    DuplicateRepository {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("repository '{repository}', remote {index}: {reason}")]
    InvalidRemote {
        repository: String,
        index: usize,
        reason: &'static str,
    },

    #[error("invalid branch '{branch}' for {owner}: {reason}")]
    InvalidBranch {
        owner: String,
        branch: String,
        reason: &'static str,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
