//! `gitsync check`: validate configuration without syncing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use gitsync_report::{ReportRenderer, Transport};

use crate::GlobalArgs;

/// Arguments for `gitsync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Repository files (`-` reads stdin).
    #[arg(required = true, value_name = "REPO_FILE")]
    pub repo_files: Vec<PathBuf>,
}

impl CheckArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let batch = super::load_batch(global.config.as_deref(), &self.repo_files)?;
        let settings = &batch.settings;

        let transport =
            Transport::from_config(&settings.report).context("invalid report configuration")?;
        ReportRenderer::new(settings.templates_dir.as_deref())
            .context("failed to load report templates")?;

        println!(
            "{} configuration OK: {} repositories, {} remotes, report transport: {}",
            "✓".green(),
            batch.repositories.len(),
            batch.remote_count(),
            transport.name()
        );
        println!("  work_dir: {}", settings.work_dir.display());
        if let Some(dir) = &settings.log_dir {
            println!("  log_dir:  {}", dir.display());
        }
        for repo in &batch.repositories {
            println!(
                "  - {} ({} remotes, branch {})",
                repo.name,
                repo.remotes.len(),
                repo.branch_or(&settings.default_branch)
            );
        }
        Ok(())
    }
}
