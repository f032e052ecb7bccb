//! # goals-cli
//!
//! Command-line front end for the goals habit tracker.
//!
//! - `goals shell`: interactive shell over an in-memory goal store
//! - `goals run <script>`: run shell commands from a file
//! - `goals list` / `goals progress`: print the configured goals and exit
//!
//! Goals live for the lifetime of the process. The store starts from the
//! `[[goals]]` seed entries in `.goals/goals.toml`.

mod commands;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use goals_core::GoalsConfig;
use tracing_subscriber::EnvFilter;

use commands::goal::{GoalCommands, Session};

/// Goals: track how often you do the things you want to do.
#[derive(Parser)]
#[command(name = "goals", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Config file (defaults to <project-root>/.goals/goals.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell.
    Shell,
    /// Run shell commands from a file, one per line.
    Run {
        /// Script file.
        script: PathBuf,
    },
    /// List the configured goals.
    List,
    /// Show progress of the configured active goals.
    Progress,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't mix with command output on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("goals_core=warn,goals_cli=warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config_path = cli
        .config
        .unwrap_or_else(|| GoalsConfig::path_for_project(&project_root));
    let config = GoalsConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    tracing::debug!(
        config = %config_path.display(),
        seeds = config.goals.len(),
        "configuration loaded"
    );

    let mut session = Session::new(config.build_store(&project_root), config.confirm_discard);

    match &cli.command {
        Commands::Shell => commands::shell::execute(&mut session),
        Commands::Run { script } => {
            let mut out = io::stdout().lock();
            commands::shell::run_script(&mut session, script, &mut out)?;
            out.flush()?;
            Ok(())
        }
        Commands::List => print_once(&mut session, &GoalCommands::List),
        Commands::Progress => print_once(&mut session, &GoalCommands::Progress),
    }
}

fn print_once(session: &mut Session, cmd: &GoalCommands) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    session.execute(cmd, &mut out)?;
    out.flush()?;
    Ok(())
}
