use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "asperitas",
    about = "Asperitas: a link aggregation REST backend",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file. Flags override its values.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the API server
    Serve(ServeArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageKind {
    Memory,
    File,
}

/// Settings shared by every subcommand that builds a configuration.
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long, value_enum)]
    pub storage: Option<StorageKind>,
    /// Directory for `--storage file`.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub session_ttl_secs: Option<u64>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,
}
