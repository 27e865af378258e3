//! # edl-ledger: Proof-of-Work Hash Chain
//!
//! The tamper-evidence layer of EduLedger. Each issued certificate is
//! recorded in a block; each block commits to its predecessor's hash and
//! carries a small proof of work.
//!
//! - [`block`]: block layout, payload variants and hashing.
//! - [`seal`]: budgeted nonce search.
//! - [`ledger`]: append, validation, snapshots and export.
//! - [`journal`]: JSON Lines persistence.
//!
//! ## Crate Policy
//!
//! - Depends only on `edl-core` internally.
//! - Blocks are never removed or reordered once committed.

pub mod block;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod seal;

pub use block::{Block, BlockPayload, GENESIS_PREVIOUS_HASH};
pub use error::{ChainFault, LedgerError};
pub use journal::Journal;
pub use ledger::{BlockView, ChainSnapshot, Ledger, MAX_DIFFICULTY};
pub use seal::{seal, SealBudget};
