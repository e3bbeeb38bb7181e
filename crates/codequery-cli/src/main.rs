//! Codequery CLI
//!
//! Ask natural-language questions about a codebase.

use anyhow::Result;
use clap::Parser;
use codequery_core::Config;

mod app;
mod commands;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    // Load config (use CODEQUERY_SNAPSHOT_DIR env var if set)
    let mut config = Config::load()?;
    if let Ok(dir) = std::env::var("CODEQUERY_SNAPSHOT_DIR") {
        config.snapshot_dir = Some(std::path::PathBuf::from(dir));
    }

    match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, &config).await,
        Commands::Ls(args) => commands::ls::run(args, &config).await,
        Commands::Ask(args) => commands::ask::run(args, &config).await,
        Commands::Repl(args) => commands::repl::run(args, &config).await,
    }
}
