//! # gitsync-engine
//!
//! Keeps a local mirror of each configured repository in sync with all of
//! its remotes by shelling out to git.
//!
//! Call [`sync_repository`] for a single repository, or [`batch::run`] to
//! process a whole configuration and report the failures once.

pub mod archive;
pub mod batch;
pub mod error;
pub mod git;
pub mod log;
pub mod policy;
pub mod prepare;
pub mod repository;
pub mod runner;

#[cfg(test)]
mod testing;

pub use batch::{BatchOptions, BatchOutcome, FailureEntry, FailureKind, Reporter};
pub use error::SyncError;
pub use git::Git;
pub use log::SyncLog;
pub use policy::{Direction, RemoteOutcome, RemoteSyncReport};
pub use prepare::{PrepareOptions, Preparation};
pub use repository::{sync_repository, RepositorySync, SyncOptions};
pub use runner::{CommandRunner, CommandStatus, ProcessRunner};
