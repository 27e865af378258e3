//! # edl-registry: Certificates, Consent, Identities
//!
//! The three stores behind EduLedger's service layer:
//!
//! - **Certificates** (`certificate.rs`): anchored certificates with a
//!   primary index by id and a secondary index by subject. Sequential
//!   `CERT-NNNN` ids; signatures verified against issuer wallets.
//!
//! - **Consent** (`consent.rs`): per-subject grant history. Grants are
//!   active until revoked; revocation is one-way.
//!
//! - **Identities** (`identity.rs`): registered identities, their roles
//!   and wallets, and the role capability checks.
//!
//! ## Design
//!
//! The registries are plain data structures taking `&mut self` for writes.
//! Locking belongs to the caller, which must be able to hold the ledger
//! and certificate locks together while it commits an issuance.

pub mod certificate;
pub mod consent;
pub mod identity;

pub use certificate::{verify_signature, CertificateError, CertificateRegistry, IssuerStats};
pub use consent::{derive_grant_id, ConsentError, ConsentGrant, ConsentRegistry, ConsentStatus};
pub use identity::{
    Capability, Identity, IdentityDirectory, IdentityError, IdentitySummary,
};
