//! Package inspection tool for the loadstone content loader.
//!
//! Loads the packages under a directory exactly the way an embedding host
//! would (full four-phase startup against an empty catalog), then reports
//! what they contain.

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Dump, Packages};
use tracing_subscriber::EnvFilter;

/// Content package inspection tools
#[derive(Parser)]
#[command(name = "loadstone")]
#[command(about = "Inspect loadstone content packages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Load every package in a directory and dump the loaded content
    Dump(Dump),

    /// List discoverable packages and their manifests
    Packages(Packages),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Dump(cmd) => cmd.execute(),
        Command::Packages(cmd) => cmd.execute(),
    }
}
