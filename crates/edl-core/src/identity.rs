//! # Identifier Newtypes and Roles
//!
//! Newtype wrappers for every identifier namespace. A `CertificateId`
//! cannot be passed where an `IdentityId` is expected, and a `GrantId`
//! cannot stand in for either.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum length of an identity handle.
pub const MAX_IDENTITY_LEN: usize = 64;

/// Prefix of every certificate id.
pub const CERTIFICATE_ID_PREFIX: &str = "CERT-";

/// A registered identity handle (e.g. `"alice"`, `"inst1"`, `"hrX"`).
///
/// Trimmed and validated on construction: non-empty, at most
/// [`MAX_IDENTITY_LEN`] characters, no interior whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "identity" });
        }
        if trimmed.chars().count() > MAX_IDENTITY_LEN {
            return Err(ValidationError::TooLong {
                field: "identity",
                max: MAX_IDENTITY_LEN,
            });
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::Format {
                field: "identity",
                reason: format!("{trimmed:?} contains whitespace"),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The role an identity holds. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// An institution that issues certificates.
    Issuer,
    /// A certificate subject who grants and revokes consent.
    Student,
    /// A third party that views certificates under consent.
    Hr,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issuer => "issuer",
            Self::Student => "student",
            Self::Hr => "hr",
        }
    }

    /// Whether this role may sign and anchor new certificates.
    pub fn can_issue(&self) -> bool {
        matches!(self, Self::Issuer)
    }

    /// Whether this role may hold certificates and manage consent for them.
    pub fn can_hold(&self) -> bool {
        matches!(self, Self::Student)
    }

    /// Whether this role may be named as a consent grantee.
    pub fn can_receive_consent(&self) -> bool {
        matches!(self, Self::Hr)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "issuer" => Ok(Self::Issuer),
            "student" => Ok(Self::Student),
            "hr" => Ok(Self::Hr),
            other => Err(ValidationError::Format {
                field: "role",
                reason: format!("unknown role {other:?}"),
            }),
        }
    }
}

/// Sequential, human-readable certificate id: `CERT-0001`, `CERT-0002`, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(String);

impl CertificateId {
    /// Build the id for the `n`-th issued certificate (1-based).
    pub fn from_sequence(n: u64) -> Self {
        Self(format!("{CERTIFICATE_ID_PREFIX}{n:04}"))
    }

    /// Parse an externally supplied id, requiring the `CERT-<digits>` shape.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let digits = s.strip_prefix(CERTIFICATE_ID_PREFIX).ok_or_else(|| {
            ValidationError::Format {
                field: "certificate_id",
                reason: format!("{s:?} does not start with {CERTIFICATE_ID_PREFIX}"),
            }
        })?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::Format {
                field: "certificate_id",
                reason: format!("{s:?} has a non-numeric sequence"),
            });
        }
        Ok(Self(s.to_string()))
    }

    /// Wrap a raw id without validation. Lookups of unknown ids then
    /// surface as not-found rather than as validation failures.
    pub fn unchecked(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The numeric sequence, if the id has the canonical shape.
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(CERTIFICATE_ID_PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short digest-derived consent grant id (16 hex chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantId(String);

impl GrantId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-supplied idempotency key for issuance requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request:{}", self.0)
    }
}
