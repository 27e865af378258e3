//! # edl-service: EduLedger Service Layer
//!
//! Assembles the ledger, the registries and the identity directory into
//! one [`CredentialService`] context and defines the error taxonomy every
//! caller sees.
//!
//! ## Operations
//!
//! - Identities: register, look up, list by role, wallet details.
//! - Issuance: sign, anchor and store a certificate; idempotent on a
//!   request id.
//! - Verification: chain validity, anchor match and issuer signature.
//! - Consent: grant, revoke, check, list, consent-gated views.
//! - Chain: export, summary, journal persistence.
//!
//! ## Crate Policy
//!
//! - Sits at the top of the library DAG; depends on every other `edl-*`
//!   library crate.
//! - No business rules here that belong to a domain crate. The service
//!   sequences calls, holds locks, and maps errors.
//! - All errors surface as [`ServiceError`].

pub mod config;
pub mod error;
pub mod service;
pub mod verifier;
pub mod views;

pub use config::{ConfigError, ServiceConfig};
pub use error::ServiceError;
pub use service::CredentialService;
pub use verifier::{IntegrityVerifier, VerificationOutcome, VerificationReport};
pub use views::{ChainSummary, ConsentGatedView, IssuanceReceipt, IssuanceRequest, WalletInfo};
