//! Request and response shapes for `CredentialService` operations.

use edl_core::{ArtifactRef, Certificate, IdentityId, RequestId, Role};
use edl_crypto::WalletAddress;
use edl_ledger::BlockView;
use serde::{Deserialize, Serialize};

/// A request to issue one certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRequest {
    pub issuer: String,
    pub subject: String,
    pub course: String,
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Idempotency key. A replay returns the original receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl IssuanceRequest {
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        course: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            course: course.into(),
            grade: grade.into(),
            artifact: None,
            request_id: None,
        }
    }

    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub(crate) fn artifact_ref(&self) -> Result<Option<ArtifactRef>, edl_core::ValidationError> {
        self.artifact.as_deref().map(ArtifactRef::new).transpose()
    }
}

/// The outcome of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceReceipt {
    pub certificate: Certificate,
    pub anchor_hash: String,
    pub block_index: u64,
    /// True when this receipt answers a replayed request id.
    pub replayed: bool,
}

/// A grantee's view of a certificate, gated on consent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentGatedView {
    pub has_consent: bool,
    pub certificate: Option<Certificate>,
}

/// Chain overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSummary {
    pub total_blocks: usize,
    pub difficulty: u32,
    pub valid: bool,
    pub blocks: Vec<BlockView>,
}

/// Public wallet details of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub identity: IdentityId,
    pub role: Role,
    pub address: WalletAddress,
    pub public_key_pem: String,
}
