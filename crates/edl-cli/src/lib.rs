//! # edl-cli: EduLedger Operator CLI
//!
//! Provides the `edl` command-line interface over the service and ledger
//! crates.
//!
//! ## Subcommands
//!
//! - `edl chain verify`: load a chain journal and check it.
//! - `edl chain export`: print a journal's blocks as JSON.
//! - `edl demo`: run the issuance, consent and verification scenario in
//!   memory, optionally persisting the chain.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the library crates and return an exit code:
//!   0 on success, 1 when a check fails. Operational errors surface as
//!   `anyhow::Error`.

pub mod chain;
pub mod demo;

use std::path::Path;

use anyhow::{Context, Result};
use edl_service::ServiceConfig;

/// Load service configuration: the YAML file when given, defaults
/// otherwise, then `EDL_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let base = match path {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    let config = base
        .with_env_overrides()
        .context("invalid environment override")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}
