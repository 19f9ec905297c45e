use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "escrow",
    about = "Two-party escrow coordinator",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with `[client]` and `[ledger]` settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a fresh identity
    Keygen(KeygenArgs),
    /// Show the canonical escrow address of an initializer
    Derive(DeriveArgs),
    /// Decode raw escrow record bytes
    Decode(DecodeArgs),
    /// Run a full escrow lifecycle against an in-process ledger
    Simulate(SimulateArgs),
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Also print the secret key
    #[arg(long)]
    pub show_secret: bool,
}

#[derive(Args)]
pub struct DeriveArgs {
    /// Initializer identity (64 hex chars, optional `id:` prefix)
    pub initializer: String,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Record bytes as hex
    pub hex: String,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Escrowed amount in base units
    #[arg(long, default_value = "1000000")]
    pub amount: u64,
    /// How the escrow ends
    #[arg(long, default_value = "claim")]
    pub settle: Settle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Settle {
    Claim,
    Cancel,
}
