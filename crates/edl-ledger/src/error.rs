//! Ledger error types.

use edl_core::CanonicalizationError;
use thiserror::Error;

/// The first structural fault found while walking a chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainFault {
    /// The chain has no blocks at all.
    #[error("chain is empty")]
    Empty,

    /// A block's position does not match its index.
    #[error("block at position {position} carries index {index}")]
    IndexMismatch { position: u64, index: u64 },

    /// A block's stored hash differs from its recomputed hash.
    #[error("block {index}: stored hash {stored} does not match computed {computed}")]
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    /// A block's `previous_hash` does not name its predecessor.
    #[error("block {index}: previous_hash {actual} does not match predecessor hash {expected}")]
    BrokenLink {
        index: u64,
        expected: String,
        actual: String,
    },

    /// A block's hash does not carry the required leading zeros.
    #[error("block {index}: hash does not meet difficulty {difficulty}")]
    DifficultyNotMet { index: u64, difficulty: u32 },

    /// The first block is not a well-formed genesis block, or a later
    /// block carries a genesis payload.
    #[error("block {index}: {reason}")]
    Genesis { index: u64, reason: String },

    /// The block could not be canonicalized for hashing.
    #[error("block {index}: {reason}")]
    Unhashable { index: u64, reason: String },
}

impl ChainFault {
    /// Index of the offending block, if the fault names one.
    pub fn index(&self) -> Option<u64> {
        match self {
            Self::Empty => None,
            Self::IndexMismatch { position, .. } => Some(*position),
            Self::HashMismatch { index, .. }
            | Self::BrokenLink { index, .. }
            | Self::DifficultyNotMet { index, .. }
            | Self::Genesis { index, .. }
            | Self::Unhashable { index, .. } => Some(*index),
        }
    }
}

/// Errors raised by ledger mutation and persistence.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Difficulty outside the representable range.
    #[error("difficulty {difficulty} exceeds maximum {max}")]
    InvalidDifficulty { difficulty: u32, max: u32 },

    /// Sealing gave up before finding a qualifying nonce.
    #[error(
        "seal budget exhausted for block {index} at difficulty {difficulty} \
         after {attempts} attempts ({elapsed_ms} ms)"
    )]
    SealBudgetExhausted {
        index: u64,
        difficulty: u32,
        attempts: u64,
        elapsed_ms: u64,
    },

    /// A sealed candidate no longer extends the current tip.
    #[error("stale candidate: expected index {expected}, got {actual}")]
    StaleCandidate { expected: u64, actual: u64 },

    /// A candidate failed its commit-time re-check.
    #[error("rejected block: {0}")]
    Rejected(ChainFault),

    /// Canonicalization failed while hashing.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A journal could not be parsed or does not form a valid chain.
    #[error("journal {path}, line {line}: {reason}")]
    Journal {
        path: String,
        line: usize,
        reason: String,
    },

    /// Journal I/O failed.
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),
}
