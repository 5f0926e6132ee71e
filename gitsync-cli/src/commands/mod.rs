//! Subcommands and the configuration loading they share.

pub mod check;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use gitsync_core::{config, BatchConfig};

/// Resolve the settings file and load it together with `repo_files`.
pub fn load_batch(explicit: Option<&Path>, repo_files: &[PathBuf]) -> Result<BatchConfig> {
    let stdin_count = repo_files
        .iter()
        .filter(|p| p.as_os_str() == config::STDIN_PATH)
        .count();
    if stdin_count > 1 {
        bail!("'-' (stdin) can be given only once");
    }

    let cwd = std::env::current_dir().context("could not determine current directory")?;
    let settings_path =
        config::resolve_settings_path(explicit, &cwd, dirs::config_dir().as_deref())?;
    tracing::debug!(settings = %settings_path.display(), "loading configuration");

    config::load_batch(&settings_path, repo_files)
        .with_context(|| format!("invalid configuration (settings: {})", settings_path.display()))
}
