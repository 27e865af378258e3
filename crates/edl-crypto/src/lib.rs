//! # edl-crypto: Issuer Wallets
//!
//! Every identity in EduLedger owns exactly one [`Wallet`]: an RSA-2048
//! keypair plus a short address derived from the public key.
//!
//! - **RSASSA-PSS** (SHA-256, MGF1) signatures over [`CanonicalBytes`].
//!   The salt is random, so two signatures over the same bytes differ and
//!   both verify.
//! - **PEM public keys** (SubjectPublicKeyInfo) for distribution.
//! - **Addresses**: the first 20 hex characters of sha256 over the PEM.
//!   Display handle only; not collision resistant.
//!
//! ## Crate Policy
//!
//! - Depends only on `edl-core` internally.
//! - Private keys are never serialized and never printed by `Debug`.
//! - No mocking of cryptographic operations in tests.
//!
//! [`CanonicalBytes`]: edl_core::CanonicalBytes

pub mod error;
pub mod wallet;

pub use error::WalletError;
pub use wallet::{
    derive_address, verify_with_public_key, RsaSignature, Wallet, WalletAddress,
    WalletPublicKey, ADDRESS_HEX_LEN, KEY_BITS,
};
