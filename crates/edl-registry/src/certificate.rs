//! # Certificate Registry
//!
//! Owns every issued [`Certificate`]. Certificates are only ever added,
//! never removed, and only after they carry a ledger anchor.
//!
//! ## Issuance Protocol
//!
//! 1. [`CertificateRegistry::draft`] reserves nothing: it builds the body
//!    under the next free id and signs its canonical bytes with the
//!    issuer's wallet.
//! 2. The caller records the signed certificate in the ledger and sets the
//!    returned block hash as its anchor.
//! 3. [`CertificateRegistry::insert_anchored`] stores it and advances the
//!    id sequence.
//!
//! A failure between (1) and (3) therefore consumes no id.

use std::collections::{BTreeMap, HashMap};

use edl_core::{
    ArtifactRef, AnchorAlreadySet, CanonicalizationError, Certificate, CertificateBody,
    CertificateId, CryptoError, IdentityId, IssueDate, RequestId, SignatureRecord, Timestamp,
    ValidationError,
};
use edl_crypto::{verify_with_public_key, RsaSignature, Wallet, WalletPublicKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a course title.
pub const MAX_COURSE_LEN: usize = 200;

/// Maximum length of a grade.
pub const MAX_GRADE_LEN: usize = 16;

/// Errors raised by the certificate registry.
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    #[error("certificate {0} already exists")]
    Duplicate(CertificateId),

    /// An insert skipped or reused an id.
    #[error("certificate {actual} is out of sequence, expected {expected}")]
    OutOfSequence {
        expected: CertificateId,
        actual: CertificateId,
    },

    #[error("certificate {0} has no ledger anchor")]
    NotAnchored(CertificateId),

    #[error("{signer} has already signed certificate {id}")]
    AlreadySigned { id: CertificateId, signer: IdentityId },

    #[error("certificate {id} has no signature from {signer}")]
    MissingSignature { id: CertificateId, signer: IdentityId },

    #[error(transparent)]
    Anchor(#[from] AnchorAlreadySet),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Issuance counts for one issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerStats {
    pub issuer: IdentityId,
    pub total_issued: usize,
    pub by_subject: BTreeMap<IdentityId, usize>,
}

/// In-memory store of anchored certificates.
#[derive(Debug, Default)]
pub struct CertificateRegistry {
    certificates: HashMap<CertificateId, Certificate>,
    by_subject: HashMap<IdentityId, Vec<CertificateId>>,
    order: Vec<CertificateId>,
    requests: HashMap<RequestId, CertificateId>,
}

impl CertificateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The id the next stored certificate must carry.
    pub fn next_id(&self) -> CertificateId {
        CertificateId::from_sequence(self.order.len() as u64 + 1)
    }

    /// Build and sign the next certificate. Nothing is stored.
    pub fn draft(
        &self,
        subject: IdentityId,
        issuer: &Wallet,
        course: &str,
        grade: &str,
        artifact: Option<ArtifactRef>,
    ) -> Result<Certificate, CertificateError> {
        let body = CertificateBody {
            id: self.next_id(),
            subject,
            issuer: issuer.owner().clone(),
            course: bounded("course", course, MAX_COURSE_LEN)?,
            grade: bounded("grade", grade, MAX_GRADE_LEN)?,
            issue_date: IssueDate::today(),
            artifact,
        };
        let mut certificate = Certificate::new(body);
        certificate.add_signature(sign_body(certificate.body(), issuer)?);
        Ok(certificate)
    }

    /// Draft, anchor and store the next certificate in one step.
    ///
    /// `anchor` records the signed certificate (normally as a ledger block)
    /// and returns the hash to anchor it to. If `anchor` fails nothing is
    /// stored.
    pub fn issue<E>(
        &mut self,
        subject: IdentityId,
        issuer: &Wallet,
        course: &str,
        grade: &str,
        artifact: Option<ArtifactRef>,
        anchor: impl FnOnce(&Certificate) -> Result<String, E>,
    ) -> Result<&Certificate, E>
    where
        E: From<CertificateError>,
    {
        let mut certificate = self.draft(subject, issuer, course, grade, artifact)?;
        let hash = anchor(&certificate)?;
        certificate
            .set_anchor(hash)
            .map_err(CertificateError::from)?;
        Ok(self.insert_anchored(certificate, None)?)
    }

    /// Store an anchored certificate, optionally under an idempotency key.
    pub fn insert_anchored(
        &mut self,
        certificate: Certificate,
        request: Option<RequestId>,
    ) -> Result<&Certificate, CertificateError> {
        let id = certificate.id().clone();
        if self.certificates.contains_key(&id) {
            return Err(CertificateError::Duplicate(id));
        }
        let expected = self.next_id();
        if id != expected {
            return Err(CertificateError::OutOfSequence {
                expected,
                actual: id,
            });
        }
        if !certificate.is_anchored() {
            return Err(CertificateError::NotAnchored(id));
        }

        self.by_subject
            .entry(certificate.subject().clone())
            .or_default()
            .push(id.clone());
        if let Some(request) = request {
            self.requests.insert(request, id.clone());
        }
        self.order.push(id.clone());
        tracing::info!(
            certificate = %id,
            subject = %certificate.subject(),
            issuer = %certificate.issuer(),
            "certificate stored"
        );
        Ok(self.certificates.entry(id).or_insert(certificate))
    }

    /// The certificate produced by an earlier request with this key.
    pub fn by_request(&self, request: &RequestId) -> Option<&Certificate> {
        self.requests
            .get(request)
            .and_then(|id| self.certificates.get(id))
    }

    pub fn get(&self, id: &CertificateId) -> Option<&Certificate> {
        self.certificates.get(id)
    }

    pub fn require(&self, id: &CertificateId) -> Result<&Certificate, CertificateError> {
        self.get(id)
            .ok_or_else(|| CertificateError::NotFound(id.clone()))
    }

    /// A subject's certificates in issuance order.
    pub fn by_subject(&self, subject: &IdentityId) -> Vec<&Certificate> {
        self.by_subject
            .get(subject)
            .map(|ids| ids.iter().filter_map(|id| self.certificates.get(id)).collect())
            .unwrap_or_default()
    }

    /// All certificates in issuance order.
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.order.iter().filter_map(|id| self.certificates.get(id))
    }

    /// Append an additional signature by `signer` over the certificate body.
    pub fn countersign(
        &mut self,
        id: &CertificateId,
        signer: &Wallet,
    ) -> Result<SignatureRecord, CertificateError> {
        let certificate = self
            .certificates
            .get_mut(id)
            .ok_or_else(|| CertificateError::NotFound(id.clone()))?;
        if certificate
            .signatures()
            .iter()
            .any(|s| &s.signer == signer.owner())
        {
            return Err(CertificateError::AlreadySigned {
                id: id.clone(),
                signer: signer.owner().clone(),
            });
        }
        let record = sign_body(certificate.body(), signer)?;
        certificate.add_signature(record.clone());
        tracing::info!(certificate = %id, signer = %signer.owner(), "certificate countersigned");
        Ok(record)
    }

    pub fn issuer_stats(&self, issuer: &IdentityId) -> IssuerStats {
        let mut by_subject = BTreeMap::new();
        let mut total_issued = 0;
        for certificate in self.iter().filter(|c| c.issuer() == issuer) {
            total_issued += 1;
            *by_subject.entry(certificate.subject().clone()).or_insert(0) += 1;
        }
        IssuerStats {
            issuer: issuer.clone(),
            total_issued,
            by_subject,
        }
    }
}

/// Verify the signature `signer` made over the certificate body.
pub fn verify_signature(
    certificate: &Certificate,
    signer: &IdentityId,
    public_key: &WalletPublicKey,
) -> Result<(), CertificateError> {
    let record = certificate
        .signatures()
        .iter()
        .find(|s| &s.signer == signer)
        .ok_or_else(|| CertificateError::MissingSignature {
            id: certificate.id().clone(),
            signer: signer.clone(),
        })?;
    let signature = RsaSignature::from_hex(&record.signature)?;
    verify_with_public_key(&certificate.body().signing_bytes()?, &signature, public_key)?;
    Ok(())
}

fn sign_body(body: &CertificateBody, wallet: &Wallet) -> Result<SignatureRecord, CertificateError> {
    let signature = wallet.sign(&body.signing_bytes()?)?;
    Ok(SignatureRecord {
        signer: wallet.owner().clone(),
        signature: signature.to_hex(),
        timestamp: Timestamp::now(),
    })
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}
