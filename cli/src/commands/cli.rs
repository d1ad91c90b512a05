use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Natural-language command gateway with human approval")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP gateway.
    Serve(ServeArgs),
    /// Evaluate a command against the policy without running it.
    Check(CheckArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Overrides `server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides `server.port`.
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub session_id: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long)]
    pub command: String,

    /// Working directory; relative paths are taken from the sandbox root.
    #[arg(long)]
    pub cwd: Option<String>,
}
