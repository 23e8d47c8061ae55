//! Inkframe CLI — Extract battle events from recorded detection results.
//!
//! Usage:
//!   inkframe analyze <DIR>     Run event extraction on a battle directory
//!   inkframe info <DIR>        Summarize the recorded inputs of a battle

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "inkframe",
    about = "Event extraction for recorded gameplay battles",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract events from a battle directory
    Analyze {
        /// Path to the battle directory
        path: PathBuf,

        /// Analyzer configuration (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output event log (defaults to <DIR>/events.jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show a summary of a battle directory
    Info {
        /// Path to the battle directory
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            config,
            output,
        } => commands::analyze::run(path, config, output, cli.verbose).await,
        Commands::Info { path } => {
            init_cli_logging(cli.verbose)?;
            commands::info::run(path)
        }
    }
}

fn init_cli_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "info" };
    inkframe_common::logging::init_logging(&inkframe_common::config::LoggingConfig {
        level: level.to_string(),
        ..Default::default()
    })?;
    Ok(())
}
