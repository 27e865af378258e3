//! # Credential Service
//!
//! The single context object behind every EduLedger operation. One
//! instance is built at startup and shared (typically as
//! `Arc<CredentialService>`); there is no global state.
//!
//! ## Locking
//!
//! - All mutating operations serialize on one writer mutex.
//! - Each store sits behind its own `RwLock`. Readers hold a read guard
//!   only long enough to clone a snapshot or a record.
//! - Issuance seals its block while holding only the writer mutex, then
//!   takes the ledger and certificate write locks together (always in
//!   that order) to commit the block and store the anchored certificate.
//!   No reader can observe the block without its certificate.
//!
//! All locks are `parking_lot` and never held across a blocking call
//! other than block sealing, which is bounded by the configured budget.

use std::path::Path;
use std::sync::Arc;

use edl_core::{Certificate, CertificateId, GrantId, IdentityId, Role};
use edl_crypto::Wallet;
use edl_ledger::{seal, BlockPayload, BlockView, Journal, Ledger};
use edl_registry::{
    Capability, CertificateRegistry, ConsentGrant, ConsentRegistry, IdentityDirectory,
    IdentitySummary, IssuerStats,
};
use parking_lot::{Mutex, RwLock};

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::verifier::{IntegrityVerifier, VerificationReport};
use crate::views::{
    ChainSummary, ConsentGatedView, IssuanceReceipt, IssuanceRequest, WalletInfo,
};

pub struct CredentialService {
    config: ServiceConfig,
    writer: Mutex<()>,
    ledger: RwLock<Ledger>,
    certificates: RwLock<CertificateRegistry>,
    consents: RwLock<ConsentRegistry>,
    identities: RwLock<IdentityDirectory>,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("config", &self.config)
            .field("blocks", &self.ledger.read().len())
            .field("certificates", &self.certificates.read().len())
            .field("identities", &self.identities.read().len())
            .finish()
    }
}

impl CredentialService {
    /// Build a service with a fresh chain.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let ledger = Ledger::new(config.difficulty)?.with_budget(config.seal_budget());
        tracing::info!(
            difficulty = config.difficulty,
            max_iterations = config.seal_max_iterations,
            timeout_ms = config.seal_timeout_ms,
            "credential service started"
        );
        Ok(Self {
            config,
            writer: Mutex::new(()),
            ledger: RwLock::new(ledger),
            certificates: RwLock::new(CertificateRegistry::new()),
            consents: RwLock::new(ConsentRegistry::new()),
            identities: RwLock::new(IdentityDirectory::new()),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // -- Identities ---------------------------------------------------------

    /// Register an identity and generate its wallet.
    pub fn register_identity(
        &self,
        id: &str,
        display_name: &str,
        role: Role,
    ) -> Result<IdentitySummary, ServiceError> {
        let id = IdentityId::new(id)?;
        if self.identities.read().contains(&id) {
            return Err(ServiceError::Conflict(format!("identity {id} already exists")));
        }
        // Key generation is slow; do it before taking any lock.
        let wallet = Arc::new(Wallet::generate(id.clone())?);

        let _writer = self.writer.lock();
        let mut identities = self.identities.write();
        let identity = identities.register_with_wallet(id, display_name, role, wallet)?;
        Ok(identity.summary())
    }

    pub fn identity(&self, id: &str) -> Result<IdentitySummary, ServiceError> {
        let id = IdentityId::new(id)?;
        Ok(self.identities.read().require(&id)?.summary())
    }

    pub fn find_identity(&self, display_name: &str, role: Role) -> Option<IdentitySummary> {
        self.identities
            .read()
            .find_by_display_name(display_name, role)
            .map(|i| i.summary())
    }

    pub fn list_identities(&self, role: Role) -> Vec<IdentitySummary> {
        self.identities.read().list_by_role(role)
    }

    pub fn wallet_info(&self, id: &str) -> Result<WalletInfo, ServiceError> {
        let id = IdentityId::new(id)?;
        let identities = self.identities.read();
        let identity = identities.require(&id)?;
        Ok(WalletInfo {
            identity: identity.id.clone(),
            role: identity.role,
            address: identity.wallet.address().clone(),
            public_key_pem: identity.wallet.public_key().to_pem().to_string(),
        })
    }

    // -- Issuance -----------------------------------------------------------

    /// Sign, anchor and store a new certificate.
    ///
    /// Atomic: on any failure no block is committed, no certificate is
    /// stored and no id is consumed. A repeated `request_id` returns the
    /// original receipt without touching the chain.
    pub fn submit_issuance(&self, request: IssuanceRequest) -> Result<IssuanceReceipt, ServiceError> {
        let issuer_id = IdentityId::new(request.issuer.as_str())?;
        let subject_id = IdentityId::new(request.subject.as_str())?;
        let artifact = request.artifact_ref()?;

        let _writer = self.writer.lock();

        if let Some(request_id) = &request.request_id {
            let replay = self.certificates.read().by_request(request_id).cloned();
            if let Some(certificate) = replay {
                tracing::info!(request = %request_id, certificate = %certificate.id(), "issuance replayed");
                return self.receipt(certificate, true);
            }
        }

        let (issuer_wallet, subject) = {
            let identities = self.identities.read();
            let issuer = identities.require_capability(&issuer_id, Capability::IssueCertificates)?;
            let subject = identities.require_capability(&subject_id, Capability::HoldCertificates)?;
            (Arc::clone(&issuer.wallet), subject.id.clone())
        };

        let mut certificate = self.certificates.read().draft(
            subject,
            &issuer_wallet,
            &request.course,
            &request.grade,
            artifact,
        )?;

        let mut candidate = self.ledger.read().prepare(BlockPayload::CertificateIssued {
            certificate: certificate.clone(),
            issuer_address: issuer_wallet.address().to_string(),
        });
        let attempts = seal(&mut candidate, self.config.difficulty, &self.config.seal_budget())?;

        let mut ledger = self.ledger.write();
        let mut certificates = self.certificates.write();
        let block = ledger.commit(candidate)?;
        let (anchor_hash, block_index) = (block.hash.clone(), block.index);
        certificate.set_anchor(anchor_hash.clone()).map_err(edl_registry::CertificateError::from)?;
        let stored = certificates.insert_anchored(certificate, request.request_id)?.clone();

        tracing::info!(
            certificate = %stored.id(),
            issuer = %stored.issuer(),
            subject = %stored.subject(),
            block = block_index,
            attempts,
            "certificate issued"
        );
        Ok(IssuanceReceipt {
            certificate: stored,
            anchor_hash,
            block_index,
            replayed: false,
        })
    }

    fn receipt(&self, certificate: Certificate, replayed: bool) -> Result<IssuanceReceipt, ServiceError> {
        let ledger = self.ledger.read();
        let block = ledger
            .find_certificate_block(certificate.id())
            .ok_or_else(|| ServiceError::Integrity(format!("{} has no block", certificate.id())))?;
        Ok(IssuanceReceipt {
            anchor_hash: block.hash.clone(),
            block_index: block.index,
            certificate,
            replayed,
        })
    }

    /// Add a signature by another issuer to an existing certificate.
    pub fn countersign(&self, certificate_id: &str, signer: &str) -> Result<Certificate, ServiceError> {
        let id = CertificateId::unchecked(certificate_id.trim());
        let signer = IdentityId::new(signer)?;
        let _writer = self.writer.lock();
        let wallet = {
            let identities = self.identities.read();
            Arc::clone(&identities.require_capability(&signer, Capability::IssueCertificates)?.wallet)
        };
        let mut certificates = self.certificates.write();
        certificates.countersign(&id, &wallet)?;
        Ok(certificates.require(&id)?.clone())
    }

    // -- Lookup and verification --------------------------------------------

    pub fn verify(&self, certificate_id: &str) -> VerificationReport {
        let id = CertificateId::unchecked(certificate_id.trim());
        // Same lock order as issuance, so the snapshot and the registry
        // agree on which certificates are anchored.
        let ledger = self.ledger.read();
        let certificates = self.certificates.read();
        let chain = ledger.snapshot();
        drop(ledger);
        let identities = self.identities.read();
        IntegrityVerifier::new(&chain, &certificates, &identities).verify(&id)
    }

    pub fn certificate(&self, certificate_id: &str) -> Result<Certificate, ServiceError> {
        let id = CertificateId::unchecked(certificate_id.trim());
        Ok(self.certificates.read().require(&id)?.clone())
    }

    /// Every issued certificate, in issuance order.
    pub fn all_certificates(&self) -> Vec<Certificate> {
        self.certificates.read().iter().cloned().collect()
    }

    pub fn certificates_of(&self, subject: &str) -> Result<Vec<Certificate>, ServiceError> {
        let subject = IdentityId::new(subject)?;
        self.identities.read().require(&subject)?;
        Ok(self
            .certificates
            .read()
            .by_subject(&subject)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn issuer_stats(&self, issuer: &str) -> Result<IssuerStats, ServiceError> {
        let issuer = IdentityId::new(issuer)?;
        self.identities
            .read()
            .require_capability(&issuer, Capability::IssueCertificates)?;
        Ok(self.certificates.read().issuer_stats(&issuer))
    }

    // -- Consent ------------------------------------------------------------

    /// Let `grantee` view one of `subject`'s certificates.
    pub fn grant_consent(
        &self,
        subject: &str,
        grantee: &str,
        certificate_id: &str,
    ) -> Result<GrantId, ServiceError> {
        let subject = IdentityId::new(subject)?;
        let grantee = IdentityId::new(grantee)?;
        let id = CertificateId::unchecked(certificate_id.trim());

        let _writer = self.writer.lock();
        {
            let identities = self.identities.read();
            identities.require_capability(&subject, Capability::HoldCertificates)?;
            identities.require_capability(&grantee, Capability::ReceiveConsent)?;
        }
        self.require_owned(&subject, &id)?;
        Ok(self.consents.write().grant(&subject, &grantee, &id)?)
    }

    pub fn revoke_consent(&self, subject: &str, grant_id: &str) -> Result<ConsentGrant, ServiceError> {
        let subject = IdentityId::new(subject)?;
        let grant_id = GrantId::new(grant_id.trim());
        let _writer = self.writer.lock();
        self.identities
            .read()
            .require_capability(&subject, Capability::HoldCertificates)?;
        Ok(self.consents.write().revoke(&subject, &grant_id)?.clone())
    }

    pub fn check_consent(
        &self,
        subject: &str,
        grantee: &str,
        certificate_id: &str,
    ) -> Result<bool, ServiceError> {
        let subject = IdentityId::new(subject)?;
        let grantee = IdentityId::new(grantee)?;
        let id = CertificateId::unchecked(certificate_id.trim());
        Ok(self.consents.read().check(&subject, &grantee, &id))
    }

    pub fn list_consents(&self, subject: &str) -> Result<Vec<ConsentGrant>, ServiceError> {
        let subject = IdentityId::new(subject)?;
        self.identities.read().require(&subject)?;
        Ok(self.consents.read().list(&subject).to_vec())
    }

    /// A grantee's consent-gated view of one certificate.
    pub fn view_certificate(
        &self,
        grantee: &str,
        certificate_id: &str,
    ) -> Result<ConsentGatedView, ServiceError> {
        let grantee = IdentityId::new(grantee)?;
        let id = CertificateId::unchecked(certificate_id.trim());
        self.identities
            .read()
            .require_capability(&grantee, Capability::ReceiveConsent)?;

        let certificate = self.certificates.read().require(&id)?.clone();
        let has_consent = self
            .consents
            .read()
            .check(certificate.subject(), &grantee, &id);
        tracing::debug!(grantee = %grantee, certificate = %id, has_consent, "certificate view");
        Ok(ConsentGatedView {
            has_consent,
            certificate: has_consent.then_some(certificate),
        })
    }

    /// Every certificate `grantee` currently holds consent for.
    pub fn accessible_certificates(&self, grantee: &str) -> Result<Vec<Certificate>, ServiceError> {
        let grantee = IdentityId::new(grantee)?;
        self.identities
            .read()
            .require_capability(&grantee, Capability::ReceiveConsent)?;
        let ids = self.consents.read().accessible_to(&grantee);
        let certificates = self.certificates.read();
        Ok(ids
            .iter()
            .filter_map(|id| certificates.get(id).cloned())
            .collect())
    }

    fn require_owned(&self, subject: &IdentityId, id: &CertificateId) -> Result<(), ServiceError> {
        let certificates = self.certificates.read();
        let certificate = certificates.require(id)?;
        if certificate.subject() != subject {
            return Err(ServiceError::Forbidden(format!(
                "certificate {id} does not belong to {subject}"
            )));
        }
        Ok(())
    }

    // -- Chain --------------------------------------------------------------

    pub fn export_chain(&self) -> Vec<BlockView> {
        self.ledger.read().snapshot().export()
    }

    pub fn chain_summary(&self) -> ChainSummary {
        let chain = self.ledger.read().snapshot();
        ChainSummary {
            total_blocks: chain.len(),
            difficulty: chain.difficulty(),
            valid: chain.validate_chain(),
            blocks: chain.export(),
        }
    }

    /// Write the whole chain to a journal file, replacing its contents.
    pub fn persist_chain(&self, path: impl AsRef<Path>) -> Result<usize, ServiceError> {
        let chain = self.ledger.read().snapshot();
        Journal::new(path.as_ref()).write_all(chain.blocks())?;
        Ok(chain.len())
    }
}
