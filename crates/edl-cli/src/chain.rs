//! # Chain Subcommand
//!
//! Offline checks over a chain journal written by `persist_chain` or
//! `edl demo --journal`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use edl_ledger::{Journal, Ledger, LedgerError};
use edl_service::ServiceConfig;

/// Arguments for the `edl chain` subcommand.
#[derive(Args, Debug)]
pub struct ChainArgs {
    #[command(subcommand)]
    pub command: ChainCommand,
}

#[derive(Subcommand, Debug)]
pub enum ChainCommand {
    /// Load a journal and validate every block.
    Verify {
        /// Path to the JSON Lines journal.
        #[arg(value_name = "JOURNAL")]
        journal: PathBuf,

        /// Also check the genesis block and every block's difficulty target.
        #[arg(long)]
        strict: bool,

        /// Difficulty the chain was sealed at. Defaults to the configured value.
        #[arg(long)]
        difficulty: Option<u32>,
    },

    /// Print a journal's blocks as a JSON array.
    Export {
        /// Path to the JSON Lines journal.
        #[arg(value_name = "JOURNAL")]
        journal: PathBuf,

        /// Difficulty the chain was sealed at. Defaults to the configured value.
        #[arg(long)]
        difficulty: Option<u32>,
    },
}

/// Execute the chain subcommand.
///
/// Returns exit code: 0 when the chain is valid, 1 when it is rejected.
pub fn run_chain(args: &ChainArgs, config: &ServiceConfig) -> Result<u8> {
    match &args.command {
        ChainCommand::Verify {
            journal,
            strict,
            difficulty,
        } => {
            let difficulty = difficulty.unwrap_or(config.difficulty);
            match verify_journal(journal, difficulty, *strict)? {
                Ok(ledger) => {
                    println!(
                        "OK: {} blocks, difficulty {difficulty}, tip {}",
                        ledger.len(),
                        ledger.tip().hash
                    );
                    Ok(0)
                }
                Err(reason) => {
                    println!("FAIL: {reason}");
                    Ok(1)
                }
            }
        }
        ChainCommand::Export {
            journal,
            difficulty,
        } => {
            let difficulty = difficulty.unwrap_or(config.difficulty);
            let ledger = match verify_journal(journal, difficulty, false)? {
                Ok(ledger) => ledger,
                Err(reason) => {
                    eprintln!("FAIL: {reason}");
                    return Ok(1);
                }
            };
            let json = serde_json::to_string_pretty(&ledger.export())
                .context("failed to serialize chain export")?;
            println!("{json}");
            Ok(0)
        }
    }
}

/// Load and check a journal.
///
/// The outer error is operational (unreadable file, bad difficulty); the
/// inner `Err` is a rejection of the chain itself.
pub fn verify_journal(
    path: &Path,
    difficulty: u32,
    strict: bool,
) -> Result<std::result::Result<Ledger, String>> {
    let ledger = match Journal::load(path, difficulty) {
        Ok(ledger) => ledger,
        Err(e @ (LedgerError::Journal { .. } | LedgerError::Rejected(_))) => {
            return Ok(Err(e.to_string()))
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load journal: {}", path.display()))
        }
    };
    if strict {
        if let Err(fault) = ledger.check_chain_strict() {
            tracing::warn!(path = %path.display(), %fault, "strict check failed");
            return Ok(Err(fault.to_string()));
        }
    }
    tracing::info!(path = %path.display(), blocks = ledger.len(), strict, "journal verified");
    Ok(Ok(ledger))
}
