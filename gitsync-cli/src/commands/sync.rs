//! `gitsync sync`: run the batch and report failures.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use gitsync_core::RepositoryConfig;
use gitsync_engine::{batch, BatchOptions, BatchOutcome, Git, SyncOptions};
use gitsync_report::{Notifier, ReportRenderer, Transport};

use crate::GlobalArgs;

/// Arguments for `gitsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Repository files (`-` reads stdin).
    #[arg(required = true, value_name = "REPO_FILE")]
    pub repo_files: Vec<PathBuf>,

    /// Sync only the named repository; repeatable.
    #[arg(long, value_name = "NAME")]
    pub only: Vec<String>,

    /// Repositories synced concurrently.
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Do not send a failure report.
    #[arg(long)]
    pub no_report: bool,

    /// Print the full log of each failed repository.
    #[arg(long)]
    pub print_logs: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let batch_config = super::load_batch(global.config.as_deref(), &self.repo_files)?;
        let settings = &batch_config.settings;
        let repositories = select(&batch_config.repositories, &self.only)?;

        let notifier = if self.no_report {
            let renderer = ReportRenderer::new(settings.templates_dir.as_deref())
                .context("failed to load report templates")?;
            Notifier::new(renderer, Transport::NoReport)
        } else {
            Notifier::from_settings(settings).context("invalid report configuration")?
        };

        let git = Arc::new(Git::from_settings(&settings.git));
        let options = BatchOptions {
            sync: SyncOptions::from_settings(settings),
            log_dir: settings.log_dir.clone(),
            jobs: usize::from(self.jobs),
        };

        let outcome = batch::run(git, &repositories, &settings.work_dir, &options, &notifier)
            .context("sync batch could not run")?;
        self.print(&outcome);
        Ok(ExitCode::from(outcome.exit_code()))
    }

    fn print(&self, outcome: &BatchOutcome) {
        for done in &outcome.synced {
            println!("{} '{}' synced", "✓".green(), done.repository);
        }
        for failure in &outcome.failures {
            println!(
                "{} manual intervention required for {} in {}",
                "✗".red(),
                failure.repository,
                failure.work_dir.display()
            );
            if let Some(path) = &failure.archived_log {
                println!("  log archived at {}", path.display());
            }
            if self.print_logs {
                match &failure.log {
                    Some(log) => print!("{log}"),
                    None => println!("  {}", failure.message),
                }
            }
        }
        if let Some(err) = &outcome.report_error {
            eprintln!("{} failure report not delivered: {err}", "warning:".yellow().bold());
        }
        println!(
            "{} synced, {} failed",
            outcome.synced.len(),
            outcome.failures.len()
        );
    }
}

/// Keep the repositories named in `only`, or all when it is empty.
fn select(all: &[RepositoryConfig], only: &[String]) -> Result<Vec<RepositoryConfig>> {
    if only.is_empty() {
        return Ok(all.to_vec());
    }
    for name in only {
        if !all.iter().any(|r| r.name.as_str() == name) {
            bail!("unknown repository '{name}'");
        }
    }
    Ok(all
        .iter()
        .filter(|r| only.iter().any(|n| n == r.name.as_str()))
        .cloned()
        .collect())
}
