//! # Service Error Taxonomy
//!
//! Every domain error is folded into one of six kinds. Callers branch on
//! the kind; the message carries the detail.
//!
//! | Kind | Code | Raised when |
//! |---|---|---|
//! | `Validation` | `VALIDATION_ERROR` | malformed input, before any mutation |
//! | `NotFound` | `NOT_FOUND` | unknown identity, certificate or grant |
//! | `Integrity` | `INTEGRITY_ERROR` | chain or anchor check failed |
//! | `Conflict` | `CONFLICT` | duplicate registration, repeated revoke |
//! | `Forbidden` | `FORBIDDEN` | role or ownership check failed |
//! | `Internal` | `INTERNAL_ERROR` | sealing budget, crypto, I/O |

use edl_core::{CryptoError, ValidationError};
use edl_crypto::WalletError;
use edl_ledger::LedgerError;
use edl_registry::{CertificateError, ConsentError, IdentityError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Integrity(_) => "INTEGRITY_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn internal(message: String) -> Self {
        tracing::error!(error = %message, "internal error");
        Self::Internal(message)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<ConfigError> for ServiceError {
    fn from(e: ConfigError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<CryptoError> for ServiceError {
    fn from(e: CryptoError) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<WalletError> for ServiceError {
    fn from(e: WalletError) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<IdentityError> for ServiceError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Conflict(_) => Self::Conflict(e.to_string()),
            IdentityError::NotFound(_) => Self::NotFound(e.to_string()),
            IdentityError::NotPermitted { .. } => Self::Forbidden(e.to_string()),
            IdentityError::Validation(v) => v.into(),
            IdentityError::Wallet(w) => w.into(),
        }
    }
}

impl From<CertificateError> for ServiceError {
    fn from(e: CertificateError) -> Self {
        match e {
            CertificateError::NotFound(_) => Self::NotFound(e.to_string()),
            CertificateError::Duplicate(_)
            | CertificateError::AlreadySigned { .. }
            | CertificateError::Anchor(_) => Self::Conflict(e.to_string()),
            CertificateError::MissingSignature { .. } => Self::Integrity(e.to_string()),
            CertificateError::Validation(v) => v.into(),
            CertificateError::OutOfSequence { .. }
            | CertificateError::NotAnchored(_)
            | CertificateError::Canonicalization(_)
            | CertificateError::Crypto(_) => Self::internal(e.to_string()),
        }
    }
}

impl From<ConsentError> for ServiceError {
    fn from(e: ConsentError) -> Self {
        match e {
            ConsentError::NotFound { .. } => Self::NotFound(e.to_string()),
            ConsentError::AlreadyRevoked(_) => Self::Conflict(e.to_string()),
            ConsentError::Canonicalization(_) => Self::internal(e.to_string()),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidDifficulty { .. } => Self::Validation(e.to_string()),
            LedgerError::Rejected(_) | LedgerError::Journal { .. } => {
                Self::Integrity(e.to_string())
            }
            LedgerError::SealBudgetExhausted { .. }
            | LedgerError::StaleCandidate { .. }
            | LedgerError::Canonicalization(_)
            | LedgerError::Io(_) => Self::internal(e.to_string()),
        }
    }
}
