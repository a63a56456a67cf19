use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ballast",
    about = "Ballast: light client proof verification for DAG ledgers",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file [default: ./ballast.toml when present]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON array of the 12 witness addresses, overriding the configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub witnesses: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the hash of a unit or joint
    UnitHash(InputArgs),
    /// Compute the chash (address) of a definition
    Chash(InputArgs),
    /// Verify a witness proof and print its checkpoints
    VerifyWitnessProof(InputArgs),
    /// Verify a ball chain against trusted balls
    VerifyBallChain(TrustArgs),
    /// Verify a full light history response
    VerifyHistory(TrustArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// JSON input file, or `-` for stdin
    pub input: PathBuf,
}

#[derive(Args)]
pub struct TrustArgs {
    /// JSON input file, or `-` for stdin
    pub input: PathBuf,
    /// Additional trusted ball (repeatable)
    #[arg(long = "trust", value_name = "BALL")]
    pub trusted: Vec<String>,
}
