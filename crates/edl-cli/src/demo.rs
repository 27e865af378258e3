//! # Demo Subcommand
//!
//! Runs the reference issuance scenario against an in-memory service:
//! register an institution, a student and an HR reviewer, issue one
//! certificate, verify it, then grant, check, view and revoke consent.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Args;
use edl_core::Role;
use edl_service::{CredentialService, IssuanceRequest, ServiceConfig, VerificationOutcome};

/// Arguments for the `edl demo` subcommand.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Write the resulting chain to this journal file.
    #[arg(long, value_name = "PATH")]
    pub journal: Option<PathBuf>,
}

/// What the scenario observed at each step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoOutcome {
    pub certificate_id: String,
    pub anchor_hash: String,
    pub verified: bool,
    pub consent_after_grant: bool,
    pub visible_after_grant: bool,
    pub consent_after_revoke: bool,
    pub unknown_outcome: VerificationOutcome,
    pub total_blocks: usize,
    pub chain_valid: bool,
}

/// Execute the demo subcommand.
pub fn run_demo(args: &DemoArgs, config: &ServiceConfig) -> Result<u8> {
    let service = CredentialService::new(config.clone()).context("failed to start service")?;
    let outcome = run_scenario(&service)?;

    println!("issued {} anchored at {}", outcome.certificate_id, outcome.anchor_hash);
    println!("verify {}: {}", outcome.certificate_id, outcome.verified);
    println!(
        "consent after grant: {} (certificate visible: {})",
        outcome.consent_after_grant, outcome.visible_after_grant
    );
    println!("consent after revoke: {}", outcome.consent_after_revoke);
    println!("verify UNKNOWN: {:?}", outcome.unknown_outcome);
    println!(
        "chain: {} blocks, valid: {}",
        outcome.total_blocks, outcome.chain_valid
    );

    if let Some(path) = &args.journal {
        let written = service
            .persist_chain(path)
            .with_context(|| format!("failed to write journal: {}", path.display()))?;
        println!("OK: wrote {written} blocks to {}", path.display());
    }
    Ok(0)
}

/// Drive the scenario through `service`. The service must be fresh.
pub fn run_scenario(service: &CredentialService) -> Result<DemoOutcome> {
    service.register_identity("inst1", "Institute One", Role::Issuer)?;
    service.register_identity("alice", "Alice", Role::Student)?;
    service.register_identity("hrX", "Acme HR", Role::Hr)?;

    let receipt = service.submit_issuance(
        IssuanceRequest::new("inst1", "alice", "Distributed Systems", "A")
            .with_artifact("transcript-2026.pdf"),
    )?;
    let certificate_id = receipt.certificate.id().to_string();
    tracing::info!(certificate = %certificate_id, "demo certificate issued");

    let verified = service.verify(&certificate_id).valid;

    let grant = service.grant_consent("alice", "hrX", &certificate_id)?;
    let consent_after_grant = service.check_consent("alice", "hrX", &certificate_id)?;
    let visible_after_grant = service
        .view_certificate("hrX", &certificate_id)?
        .certificate
        .is_some();

    service.revoke_consent("alice", grant.as_str())?;
    let consent_after_revoke = service.check_consent("alice", "hrX", &certificate_id)?;
    ensure!(
        service.view_certificate("hrX", &certificate_id)?.certificate.is_none(),
        "certificate still visible after consent was revoked"
    );

    let unknown_outcome = service.verify("UNKNOWN").outcome;
    let summary = service.chain_summary();

    Ok(DemoOutcome {
        certificate_id,
        anchor_hash: receipt.anchor_hash,
        verified,
        consent_after_grant,
        visible_after_grant,
        consent_after_revoke,
        unknown_outcome,
        total_blocks: summary.total_blocks,
        chain_valid: summary.valid,
    })
}
