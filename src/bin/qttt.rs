//! qttt CLI - Train, play against, and inspect tabular TD agents
//!
//! This CLI provides a unified interface for:
//! - Training Q-learning and SARSA agents against scripted opponents
//! - Playing a terminal match against a saved agent
//! - Inspecting a saved agent's settings and learned values
//!
//! Log verbosity follows `RUST_LOG` (default `qttt=warn`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "qttt")]
#[command(version, about = "Tabular Q-learning and SARSA for tic-tac-toe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent against a scripted opponent
    Train(Box<qttt::cli::commands::train::TrainArgs>),

    /// Play a match against a saved agent
    Play(qttt::cli::commands::play::PlayArgs),

    /// Show a saved agent's settings and best entries
    Inspect(qttt::cli::commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qttt=warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => qttt::cli::commands::train::execute(*args),
        Commands::Play(args) => qttt::cli::commands::play::execute(args),
        Commands::Inspect(args) => qttt::cli::commands::inspect::execute(args),
    }
}
