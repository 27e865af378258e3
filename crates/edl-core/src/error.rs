//! # Error Types
//!
//! Leaf error types shared across the workspace. Crate-specific errors
//! (`LedgerError`, `ConsentError`, ...) wrap these with `#[from]`.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Floats are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation, encoding or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Canonicalization of the signing input failed.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}

/// Malformed input rejected before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or whitespace.
    #[error("{field} must not be empty")]
    Empty {
        /// Field name.
        field: &'static str,
    },

    /// A field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum permitted length.
        max: usize,
    },

    /// A field did not match its expected format.
    #[error("invalid {field}: {reason}")]
    Format {
        /// Field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },
}
