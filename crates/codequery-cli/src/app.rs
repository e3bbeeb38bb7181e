//! CLI argument definitions

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "codequery")]
#[command(
    author,
    version,
    about = "Ask questions about a codebase through an agentic search loop"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a codebase snapshot from a local folder or GitHub URL
    Fetch(FetchArgs),

    /// List indexed files in the current snapshot
    Ls(LsArgs),

    /// Ask a single question about the snapshot
    Ask(AskArgs),

    /// Interactive query session
    Repl(ReplArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    /// Local directory or GitHub URL (optionally with /tree/branch/path)
    pub source: String,

    /// Use only this subfolder of the repository
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct LsArgs {
    /// Path prefix to list under
    pub path: Option<String>,
}

#[derive(Args)]
pub struct AskArgs {
    /// The question
    pub question: Vec<String>,

    /// Override the iteration cap for this query
    #[arg(long)]
    pub max_iterations: Option<usize>,
}

#[derive(Args)]
pub struct ReplArgs {
    /// Override the iteration cap for the session
    #[arg(long)]
    pub max_iterations: Option<usize>,
}
