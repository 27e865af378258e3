//! # edl CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use edl_cli::chain::{run_chain, ChainArgs};
use edl_cli::demo::{run_demo, DemoArgs};

/// EduLedger: tamper-evident certificate issuance on a proof-of-work
/// hash chain, with consent-gated sharing.
#[derive(Parser, Debug)]
#[command(name = "edl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML service configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify or export a chain journal.
    Chain(ChainArgs),

    /// Run the issuance and consent scenario in memory.
    Demo(DemoArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = edl_cli::load_config(cli.config.as_deref()).and_then(|config| {
        tracing::debug!(?config, "configuration resolved");
        match &cli.command {
            Commands::Chain(args) => run_chain(args, &config),
            Commands::Demo(args) => run_demo(args, &config),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
