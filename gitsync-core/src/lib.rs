//! gitsync core library: configuration types, loading, validation, errors.
//!
//! Public API surface:
//! - [`types`]: repository, remote and settings structs
//! - [`config`]: settings / repository file loading
//! - [`validate`]: name, remote and branch rules
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;
pub mod validate;

pub use error::ConfigError;
pub use types::{
    BatchConfig, GitSettings, Identity, Remote, ReportConfig, RepositoryConfig, RepositoryFile,
    RepositoryName, Settings, SmtpConfig, DEFAULT_BRANCH,
};
