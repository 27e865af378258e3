//! # Certificate Data Model
//!
//! A certificate is split into two parts:
//!
//! - [`CertificateBody`]: the fields fixed at issuance. Its canonical form is
//!   what the issuer signs.
//! - The mutable envelope on [`Certificate`]: an append-only signature list
//!   and an anchor hash that is assigned exactly once.
//!
//! The anchor is the hash of the ledger block that records the issuance.
//! The block carries the certificate itself, so the signed bytes can never
//! include the anchor: the body is signed first, the block is sealed over
//! the signed certificate, and only then is the block hash written back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canonical::CanonicalBytes;
use crate::error::{CanonicalizationError, ValidationError};
use crate::identity::{CertificateId, IdentityId};
use crate::temporal::{IssueDate, Timestamp};

/// Number of signature hex characters shown in listings.
pub const SIGNATURE_DISPLAY_PREFIX: usize = 64;

/// Opaque reference to an externally stored artifact (e.g. a PDF).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "artifact_ref" });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The issuance-time content of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBody {
    pub id: CertificateId,
    pub subject: IdentityId,
    pub issuer: IdentityId,
    pub course: String,
    pub grade: String,
    pub issue_date: IssueDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactRef>,
}

impl CertificateBody {
    /// Canonical bytes signed by the issuer.
    pub fn signing_bytes(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }
}

/// One signature over a certificate body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub signer: IdentityId,
    /// Full hex-encoded signature. Never truncated in storage.
    pub signature: String,
    pub timestamp: Timestamp,
}

impl SignatureRecord {
    /// Leading characters of the signature for display only.
    pub fn display_prefix(&self) -> &str {
        self.signature
            .char_indices()
            .nth(SIGNATURE_DISPLAY_PREFIX)
            .map_or(self.signature.as_str(), |(end, _)| &self.signature[..end])
    }
}

/// Error raised when the one-time anchor assignment is attempted twice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("certificate {id} is already anchored at {existing}")]
pub struct AnchorAlreadySet {
    pub id: CertificateId,
    pub existing: String,
}

/// A certificate with its signatures and optional ledger anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(flatten)]
    body: CertificateBody,
    #[serde(default)]
    signatures: Vec<SignatureRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anchor: Option<String>,
}

impl Certificate {
    /// A fresh, unsigned and unanchored certificate.
    pub fn new(body: CertificateBody) -> Self {
        Self {
            body,
            signatures: Vec::new(),
            anchor: None,
        }
    }

    pub fn body(&self) -> &CertificateBody {
        &self.body
    }

    pub fn id(&self) -> &CertificateId {
        &self.body.id
    }

    pub fn subject(&self) -> &IdentityId {
        &self.body.subject
    }

    pub fn issuer(&self) -> &IdentityId {
        &self.body.issuer
    }

    pub fn signatures(&self) -> &[SignatureRecord] {
        &self.signatures
    }

    /// The signature made by the issuer at issuance, if present.
    pub fn issuer_signature(&self) -> Option<&SignatureRecord> {
        self.signatures.iter().find(|s| &s.signer == self.issuer())
    }

    pub fn add_signature(&mut self, record: SignatureRecord) {
        self.signatures.push(record);
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    /// Record the hash of the block that carries this certificate.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorAlreadySet`] if an anchor was already assigned.
    pub fn set_anchor(&mut self, block_hash: impl Into<String>) -> Result<(), AnchorAlreadySet> {
        if let Some(existing) = &self.anchor {
            return Err(AnchorAlreadySet {
                id: self.body.id.clone(),
                existing: existing.clone(),
            });
        }
        self.anchor = Some(block_hash.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> CertificateBody {
        CertificateBody {
            id: CertificateId::from_sequence(1),
            subject: IdentityId::new("alice").unwrap(),
            issuer: IdentityId::new("inst1").unwrap(),
            course: "Cryptography".to_string(),
            grade: "A".to_string(),
            issue_date: IssueDate::from_ymd(2026, 6, 1).unwrap(),
            artifact: None,
        }
    }

    #[test]
    fn display_prefix_counts_characters() {
        let mut record = SignatureRecord {
            signer: IdentityId::new("inst1").unwrap(),
            signature: "é".repeat(40),
            timestamp: Timestamp::now(),
        };
        assert_eq!(record.display_prefix(), record.signature);

        record.signature = "é".repeat(100);
        assert_eq!(record.display_prefix().chars().count(), SIGNATURE_DISPLAY_PREFIX);

        record.signature = "ab".repeat(256);
        assert_eq!(record.display_prefix(), "ab".repeat(32));
    }

    #[test]
    fn signing_bytes_exclude_signatures_and_anchor() {
        let mut cert = Certificate::new(body());
        let before = cert.body().signing_bytes().unwrap();
        cert.add_signature(SignatureRecord {
            signer: IdentityId::new("inst1").unwrap(),
            signature: "ab".repeat(256),
            timestamp: Timestamp::now(),
        });
        cert.set_anchor("00ff").unwrap();
        assert_eq!(cert.body().signing_bytes().unwrap(), before);
        assert!(!before.as_str().contains("anchor"));
        assert!(!before.as_str().contains("signatures"));
    }

    #[test]
    fn anchor_is_set_once() {
        let mut cert = Certificate::new(body());
        assert!(!cert.is_anchored());
        cert.set_anchor("00aa").unwrap();
        let err = cert.set_anchor("00bb").unwrap_err();
        assert_eq!(err.existing, "00aa");
        assert_eq!(cert.anchor(), Some("00aa"));
    }

    #[test]
    fn flattened_serialization() {
        let mut cert = Certificate::new(body());
        cert.set_anchor("00cc").unwrap();
        let value = serde_json::to_value(&cert).unwrap();
        assert_eq!(value["id"], "CERT-0001");
        assert_eq!(value["subject"], "alice");
        assert_eq!(value["issue_date"], "2026-06-01");
        assert_eq!(value["anchor"], "00cc");
        assert!(value.get("artifact").is_none());

        let back: Certificate = serde_json::from_value(value).unwrap();
        assert_eq!(back, cert);
    }

    #[test]
    fn unanchored_certificate_omits_anchor_field() {
        let value = serde_json::to_value(Certificate::new(body())).unwrap();
        assert!(value.get("anchor").is_none());
        assert_eq!(value["signatures"], serde_json::json!([]));
    }

    #[test]
    fn display_prefix_is_presentation_only() {
        let record = SignatureRecord {
            signer: IdentityId::new("inst1").unwrap(),
            signature: "f".repeat(512),
            timestamp: Timestamp::now(),
        };
        assert_eq!(record.display_prefix().len(), SIGNATURE_DISPLAY_PREFIX);
        assert_eq!(record.signature.len(), 512);
    }

    #[test]
    fn issuer_signature_lookup() {
        let mut cert = Certificate::new(body());
        assert!(cert.issuer_signature().is_none());
        cert.add_signature(SignatureRecord {
            signer: IdentityId::new("dean").unwrap(),
            signature: "01".into(),
            timestamp: Timestamp::now(),
        });
        cert.add_signature(SignatureRecord {
            signer: IdentityId::new("inst1").unwrap(),
            signature: "02".into(),
            timestamp: Timestamp::now(),
        });
        assert_eq!(cert.issuer_signature().unwrap().signature, "02");
    }
}
