//! # edl-core: Foundational Types for EduLedger
//!
//! Every other crate in the workspace depends on `edl-core`; it depends on
//! nothing internal. It owns the pieces that must agree byte-for-byte
//! across the ledger, the signing subsystem and the registries.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All hashing and signing input flows
//!    through `CanonicalBytes::new()`. Two logically identical values
//!    always produce identical bytes regardless of field insertion order.
//!
//! 2. **Newtype identifiers.** `IdentityId`, `CertificateId`, `GrantId` and
//!    `RequestId` cannot be swapped for one another or for bare strings.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is truncated to seconds and always
//!    renders with a `Z` suffix so canonical bytes are stable.
//!
//! 4. **Shared certificate model.** The ledger carries certificates inside
//!    its blocks and the registry stores them, so the data model lives here
//!    rather than in either of those crates.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `edl-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod canonical;
pub mod certificate;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use certificate::{AnchorAlreadySet, ArtifactRef, Certificate, CertificateBody, SignatureRecord};
pub use digest::{leading_zero_nibbles, sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, CryptoError, ValidationError};
pub use identity::{CertificateId, GrantId, IdentityId, RequestId, Role};
pub use temporal::{IssueDate, Timestamp};
