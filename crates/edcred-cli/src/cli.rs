use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "edcred",
    about = "EdCred — run scripted operations against in-memory credential ledgers",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Registry configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Freeze the ledger clock at this many milliseconds since the epoch
    #[arg(long, global = true)]
    pub now: Option<u64>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a script against a fresh registry
    Run(RunArgs),
    /// Parse and validate a script without executing it
    Check(CheckArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Script file: `.toml`, anything else is read as JSON
    pub script: PathBuf,
    /// Stop at the first failing operation
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    pub script: PathBuf,
}
