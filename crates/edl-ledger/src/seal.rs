//! # Proof-of-Work Sealing
//!
//! Sealing searches nonces until the block hash starts with `difficulty`
//! zero hex characters. Expected work is about `16^difficulty` hashes.
//! The search is bounded by a [`SealBudget`] so a misconfigured difficulty
//! cannot pin a writer forever.

use std::time::{Duration, Instant};

use crate::block::Block;
use crate::error::LedgerError;

/// Deadline checks happen once per this many attempts.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Upper bound on the work spent sealing one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealBudget {
    pub max_iterations: u64,
    pub timeout: Option<Duration>,
}

impl SealBudget {
    pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000_000;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(max_iterations: u64, timeout: Option<Duration>) -> Self {
        Self {
            max_iterations,
            timeout,
        }
    }

    /// No iteration cap and no deadline.
    pub fn unbounded() -> Self {
        Self::new(u64::MAX, None)
    }
}

impl Default for SealBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ITERATIONS, Some(Self::DEFAULT_TIMEOUT))
    }
}

/// Mine `block` in place: starting from its current nonce, increment until
/// the hash meets `difficulty`.
///
/// On success `block.hash` holds the qualifying hash and the number of
/// attempts is returned. On budget exhaustion the block is left with an
/// unspecified nonce and must be discarded.
pub fn seal(block: &mut Block, difficulty: u32, budget: &SealBudget) -> Result<u64, LedgerError> {
    let started = Instant::now();
    let deadline = budget.timeout.map(|t| started + t);
    let mut attempts: u64 = 0;

    loop {
        if attempts >= budget.max_iterations {
            return Err(exhausted(block, difficulty, attempts, started));
        }
        if attempts % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(exhausted(block, difficulty, attempts, started));
                }
            }
        }

        block.hash = block.compute_hash()?;
        attempts += 1;
        if block.meets_difficulty(difficulty) {
            tracing::debug!(
                index = block.index,
                nonce = block.nonce,
                attempts,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "block sealed"
            );
            return Ok(attempts);
        }
        block.nonce = block.nonce.wrapping_add(1);
    }
}

fn exhausted(block: &Block, difficulty: u32, attempts: u64, started: Instant) -> LedgerError {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::warn!(
        index = block.index,
        difficulty,
        attempts,
        elapsed_ms,
        "seal budget exhausted"
    );
    LedgerError::SealBudgetExhausted {
        index: block.index,
        difficulty,
        attempts,
        elapsed_ms,
    }
}
