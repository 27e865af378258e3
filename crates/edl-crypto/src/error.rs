//! Wallet error type.

use edl_core::CryptoError;
use thiserror::Error;

/// Errors raised while creating or using a wallet.
#[derive(Error, Debug)]
pub enum WalletError {
    /// RSA key generation failed.
    #[error("key generation failed for {owner}: {reason}")]
    KeyGeneration { owner: String, reason: String },

    /// A public key could not be encoded to or parsed from PEM.
    #[error("public key encoding failed: {0}")]
    Encoding(String),

    /// Signing or verification failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
