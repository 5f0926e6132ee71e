//! `gitsync status`: on-disk state of each configured mirror.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use gitsync_core::BatchConfig;

use crate::GlobalArgs;

/// Arguments for `gitsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Repository files (`-` reads stdin).
    #[arg(required = true, value_name = "REPO_FILE")]
    pub repo_files: Vec<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let batch = super::load_batch(global.config.as_deref(), &self.repo_files)?;
        let rows = build_rows(&batch);
        if self.json {
            print_json(&batch, rows)?;
        } else {
            print_table(&batch, rows);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum MirrorState {
    Missing,
    Initialized,
    NotARepository,
}

impl MirrorState {
    fn of(dir: &Path) -> Self {
        if !dir.exists() {
            MirrorState::Missing
        } else if dir.join(".git").exists() {
            MirrorState::Initialized
        } else {
            MirrorState::NotARepository
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MirrorState::Missing => "missing",
            MirrorState::Initialized => "initialized",
            MirrorState::NotARepository => "not a git repository",
        }
    }

    fn colored_label(&self) -> String {
        match self {
            MirrorState::Missing => self.label().bright_black().to_string(),
            MirrorState::Initialized => self.label().green().to_string(),
            MirrorState::NotARepository => self.label().yellow().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RepositoryStatus {
    repository: String,
    branch: String,
    remotes: usize,
    work_dir: PathBuf,
    state: MirrorState,
}

#[derive(Serialize)]
struct StatusJson {
    work_dir: PathBuf,
    repositories: Vec<RepositoryStatus>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "remotes")]
    remotes: usize,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "work dir")]
    work_dir: String,
}

fn build_rows(batch: &BatchConfig) -> Vec<RepositoryStatus> {
    let settings = &batch.settings;
    batch
        .repositories
        .iter()
        .map(|repo| {
            let work_dir = repo.work_dir(&settings.work_dir);
            RepositoryStatus {
                repository: repo.name.0.clone(),
                branch: repo.branch_or(&settings.default_branch).to_string(),
                remotes: repo.remotes.len(),
                state: MirrorState::of(&work_dir),
                work_dir,
            }
        })
        .collect()
}

fn print_json(batch: &BatchConfig, rows: Vec<RepositoryStatus>) -> Result<()> {
    let payload = StatusJson {
        work_dir: batch.settings.work_dir.clone(),
        repositories: rows,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(batch: &BatchConfig, rows: Vec<RepositoryStatus>) {
    let initialized = rows
        .iter()
        .filter(|r| r.state == MirrorState::Initialized)
        .count();
    println!(
        "gitsync v{} | {} repositories | {} remotes | {} initialized",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        batch.remote_count(),
        initialized,
    );
    if rows.is_empty() {
        println!("No repositories configured.");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            repository: row.repository,
            branch: row.branch,
            remotes: row.remotes,
            state: row.state.colored_label(),
            work_dir: row.work_dir.display().to_string(),
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn mirror_state_detection() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(MirrorState::of(&tmp.path().join("absent")), MirrorState::Missing);
        assert_eq!(MirrorState::of(tmp.path()), MirrorState::NotARepository);
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        assert_eq!(MirrorState::of(tmp.path()), MirrorState::Initialized);
    }
}
