//! # Integrity Verifier
//!
//! Answers one question: is this certificate recorded, unaltered, in an
//! intact chain?
//!
//! 1. The certificate must be known to the registry.
//! 2. The whole chain must pass hash and linkage validation.
//! 3. Some block must carry the certificate id and hash to its anchor.
//! 4. The issuer's signature over the body must verify against the
//!    issuer's registered public key.
//!
//! Verification never fails with an error: every outcome is a
//! [`VerificationReport`]. [`VerificationReport::into_result`] maps
//! failures onto the service error taxonomy.

use edl_core::{Certificate, CertificateId};
use edl_ledger::ChainSnapshot;
use edl_registry::{verify_signature, CertificateRegistry, IdentityDirectory};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub const MSG_VERIFIED: &str = "Certificate verified successfully";
pub const MSG_NOT_FOUND: &str = "Certificate not found";
pub const MSG_CHAIN_COMPROMISED: &str = "Blockchain integrity compromised";
pub const MSG_NOT_IN_CHAIN: &str = "Certificate not found in blockchain";
pub const MSG_SIGNATURE_INVALID: &str = "Certificate signature is invalid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    NotFound,
    ChainCompromised,
    NotInChain,
    SignatureInvalid,
}

impl VerificationOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Verified => MSG_VERIFIED,
            Self::NotFound => MSG_NOT_FOUND,
            Self::ChainCompromised => MSG_CHAIN_COMPROMISED,
            Self::NotInChain => MSG_NOT_IN_CHAIN,
            Self::SignatureInvalid => MSG_SIGNATURE_INVALID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub certificate_id: CertificateId,
    pub valid: bool,
    pub outcome: VerificationOutcome,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

impl VerificationReport {
    fn new(id: &CertificateId, outcome: VerificationOutcome, certificate: Option<Certificate>) -> Self {
        Self {
            certificate_id: id.clone(),
            valid: outcome == VerificationOutcome::Verified,
            outcome,
            reason: outcome.message().to_string(),
            certificate,
        }
    }

    /// The verified certificate, or the error matching the outcome.
    pub fn into_result(self) -> Result<Certificate, ServiceError> {
        let detail = format!("{}: {}", self.certificate_id, self.reason);
        match (self.outcome, self.certificate) {
            (VerificationOutcome::Verified, Some(certificate)) => Ok(certificate),
            (VerificationOutcome::NotFound, _) => Err(ServiceError::NotFound(detail)),
            (VerificationOutcome::Verified, None) => Err(ServiceError::Internal(detail)),
            (
                VerificationOutcome::ChainCompromised
                | VerificationOutcome::NotInChain
                | VerificationOutcome::SignatureInvalid,
                _,
            ) => Err(ServiceError::Integrity(detail)),
        }
    }
}

/// Borrowed view over the chain and registries needed to verify.
pub struct IntegrityVerifier<'a> {
    chain: &'a ChainSnapshot,
    certificates: &'a CertificateRegistry,
    identities: &'a IdentityDirectory,
}

impl<'a> IntegrityVerifier<'a> {
    pub fn new(
        chain: &'a ChainSnapshot,
        certificates: &'a CertificateRegistry,
        identities: &'a IdentityDirectory,
    ) -> Self {
        Self {
            chain,
            certificates,
            identities,
        }
    }

    pub fn verify(&self, id: &CertificateId) -> VerificationReport {
        let Some(certificate) = self.certificates.get(id) else {
            return VerificationReport::new(id, VerificationOutcome::NotFound, None);
        };

        if let Err(fault) = self.chain.check_chain() {
            tracing::warn!(certificate = %id, %fault, "chain validation failed during verification");
            return VerificationReport::new(id, VerificationOutcome::ChainCompromised, None);
        }

        let anchored = certificate.anchor().is_some_and(|anchor| {
            self.chain
                .blocks()
                .iter()
                .any(|b| b.payload.certificate_id() == Some(id) && b.hash == anchor)
        });
        if !anchored {
            tracing::warn!(certificate = %id, anchor = ?certificate.anchor(), "anchor does not match any block");
            return VerificationReport::new(id, VerificationOutcome::NotInChain, None);
        }

        let signature_ok = self
            .identities
            .get(certificate.issuer())
            .map(|issuer| {
                verify_signature(certificate, certificate.issuer(), issuer.wallet.public_key())
            });
        match signature_ok {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                tracing::warn!(certificate = %id, error = %e, "issuer signature rejected");
                return VerificationReport::new(id, VerificationOutcome::SignatureInvalid, None);
            }
            None => {
                tracing::warn!(certificate = %id, issuer = %certificate.issuer(), "issuer not registered");
                return VerificationReport::new(id, VerificationOutcome::SignatureInvalid, None);
            }
        }

        tracing::debug!(certificate = %id, "certificate verified");
        VerificationReport::new(id, VerificationOutcome::Verified, Some(certificate.clone()))
    }
}
