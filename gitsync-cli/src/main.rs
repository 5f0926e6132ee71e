//! gitsync: keep local mirrors in sync with every remote of a repository.
//!
//! # Usage
//!
//! ```text
//! gitsync [--config <FILE>] [-v|-vv] [-q] [--log-format text|json] <COMMAND>
//!
//! gitsync sync   <REPO_FILE>... [--only <NAME>]... [--jobs <N>] [--no-report] [--print-logs]
//! gitsync check  <REPO_FILE>...
//! gitsync status <REPO_FILE>... [--json]
//! ```
//!
//! Exit status: 0 all repositories synced, 1 at least one needs manual
//! intervention, 2 configuration or usage error.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use commands::{check::CheckArgs, status::StatusArgs, sync::SyncArgs};
use logging::LogFormat;

/// Exit status for configuration and usage errors.
const EXIT_CONFIG_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "gitsync",
    version,
    about = "Synchronize Git repositories across multiple remotes via pull and push",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Settings file (default: ./config.yml, then <config dir>/gitsync/config.yml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More output; repeat for trace level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pull from and push to every remote of every repository.
    Sync(SyncArgs),

    /// Load and validate the configuration without touching any repository.
    Check(CheckArgs),

    /// Show the on-disk state of each configured mirror.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let Cli { global, command } = Cli::parse();
    logging::init(global.verbose, global.quiet, global.log_format);

    let result = match command {
        Commands::Sync(args) => args.run(&global),
        Commands::Check(args) => args.run(&global).map(|()| ExitCode::SUCCESS),
        Commands::Status(args) => args.run(&global).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}
