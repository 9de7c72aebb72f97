//! # motiv-cli
//!
//! Command-line interface for Motiv.
//!
//! - `motiv goal add/list/show/edit/delete` — manage goals
//! - `motiv goal done/fail/reactivate` — resolve or reopen goals
//! - `motiv goal pause/unpause/force/activate` — steer what is active
//! - `motiv review record/due` — re-rate goals on their review cadence

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use motiv_goal::MotivPaths;
use tracing_subscriber::EnvFilter;

/// Motiv — rank your goals, keep a few active, re-rate them over time.
#[derive(Parser)]
#[command(name = "motiv", version, about)]
struct Cli {
    /// Project root directory holding `.motiv/` (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
    /// Re-rate goals and see which are due.
    Review {
        #[command(subcommand)]
        command: commands::review::ReviewCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("motiv_goal=info,motiv_cli=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let paths = MotivPaths::for_project(&project_root);
    tracing::debug!(root = %paths.root.display(), "using project root");

    match &cli.command {
        Commands::Goal { command } => commands::goal::execute(command, &paths),
        Commands::Review { command } => commands::review::execute(command, &paths),
    }
}
