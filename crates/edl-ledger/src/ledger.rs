//! # Ledger
//!
//! An append-only chain of sealed [`Block`]s starting at a genesis block.
//!
//! ## Integrity Model
//!
//! 1. Every block's hash is recomputed from its canonical content.
//! 2. Every non-genesis block names its predecessor's hash.
//! 3. Non-genesis hashes carry `difficulty` leading zero hex characters.
//!
//! [`Ledger::validate_chain`] checks (1) and (2) from index 1 onward.
//! [`Ledger::check_chain_strict`] additionally checks (3) and the genesis
//! sentinel.
//!
//! ## Append Protocol
//!
//! `append` is `prepare` + [`seal`] + `commit`. Callers that must not hold
//! a lock while mining call the three steps separately: `commit` re-checks
//! the candidate against the current tip, so a candidate prepared against
//! an older tip is rejected rather than forking the chain.
//!
//! ## Snapshots
//!
//! Blocks live behind an `Arc`. [`Ledger::snapshot`] clones the `Arc`, and
//! the next commit copies the vector if a snapshot is still alive, so
//! readers never observe a half-applied append.

use std::sync::Arc;

use edl_core::{CertificateId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockPayload, GENESIS_PREVIOUS_HASH};
use crate::error::{ChainFault, LedgerError};
use crate::seal::{seal, SealBudget};

/// A hash has 64 hex characters, so no target beyond this can be met.
pub const MAX_DIFFICULTY: u32 = 64;

/// Flattened, read-only rendering of a block for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    pub index: u64,
    pub timestamp: Timestamp,
    pub hash: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub payload_kind: String,
    pub payload: BlockPayload,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            timestamp: block.timestamp,
            hash: block.hash.clone(),
            previous_hash: block.previous_hash.clone(),
            nonce: block.nonce,
            payload_kind: block.payload.kind().to_string(),
            payload: block.payload.clone(),
        }
    }
}

/// The proof-of-work ledger. Always holds at least the genesis block.
#[derive(Debug, Clone)]
pub struct Ledger {
    difficulty: u32,
    budget: SealBudget,
    blocks: Arc<Vec<Block>>,
}

/// An immutable view of the chain at one point in time.
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    difficulty: u32,
    blocks: Arc<Vec<Block>>,
}

impl Ledger {
    /// Create a chain holding a fresh genesis block.
    pub fn new(difficulty: u32) -> Result<Self, LedgerError> {
        check_difficulty(difficulty)?;
        let genesis = Block::genesis(Timestamp::now())?;
        tracing::info!(difficulty, hash = %genesis.hash, "ledger created");
        Ok(Self {
            difficulty,
            budget: SealBudget::default(),
            blocks: Arc::new(vec![genesis]),
        })
    }

    /// Rebuild a ledger from existing blocks without validating them.
    ///
    /// Used when restoring a persisted chain; run [`Ledger::check_chain`]
    /// before trusting the result.
    pub fn from_blocks(blocks: Vec<Block>, difficulty: u32) -> Result<Self, LedgerError> {
        check_difficulty(difficulty)?;
        if blocks.is_empty() {
            return Err(LedgerError::Rejected(ChainFault::Empty));
        }
        Ok(Self {
            difficulty,
            budget: SealBudget::default(),
            blocks: Arc::new(blocks),
        })
    }

    pub fn with_budget(mut self, budget: SealBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn budget(&self) -> &SealBudget {
        &self.budget
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The most recent block.
    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            difficulty: self.difficulty,
            blocks: Arc::clone(&self.blocks),
        }
    }

    /// Build an unsealed candidate that extends the current tip.
    pub fn prepare(&self, payload: BlockPayload) -> Block {
        let tip = self.tip();
        Block::candidate(tip.index + 1, Timestamp::now(), payload, tip.hash.clone())
    }

    /// Re-check a sealed candidate against the current tip and push it.
    pub fn commit(&mut self, block: Block) -> Result<&Block, LedgerError> {
        let expected = self.blocks.len() as u64;
        if block.index != expected {
            return Err(LedgerError::StaleCandidate {
                expected,
                actual: block.index,
            });
        }
        let tip_hash = &self.tip().hash;
        if &block.previous_hash != tip_hash {
            return Err(LedgerError::Rejected(ChainFault::BrokenLink {
                index: block.index,
                expected: tip_hash.clone(),
                actual: block.previous_hash.clone(),
            }));
        }
        if block.is_genesis() {
            return Err(LedgerError::Rejected(ChainFault::Genesis {
                index: block.index,
                reason: "genesis payload after index 0".to_string(),
            }));
        }
        let computed = block.compute_hash()?;
        if computed != block.hash {
            return Err(LedgerError::Rejected(ChainFault::HashMismatch {
                index: block.index,
                stored: block.hash.clone(),
                computed,
            }));
        }
        if !block.meets_difficulty(self.difficulty) {
            return Err(LedgerError::Rejected(ChainFault::DifficultyNotMet {
                index: block.index,
                difficulty: self.difficulty,
            }));
        }

        tracing::info!(
            index = block.index,
            nonce = block.nonce,
            hash = %block.hash,
            kind = block.payload.kind(),
            "block committed"
        );
        let index = block.index as usize;
        Arc::make_mut(&mut self.blocks).push(block);
        Ok(&self.blocks[index])
    }

    /// Prepare, seal under the ledger's budget, and commit a new block.
    pub fn append(&mut self, payload: BlockPayload) -> Result<Block, LedgerError> {
        let mut candidate = self.prepare(payload);
        seal(&mut candidate, self.difficulty, &self.budget)?;
        self.commit(candidate).cloned()
    }

    /// Hash and linkage check for every block from index 1.
    pub fn validate_chain(&self) -> bool {
        self.check_chain().is_ok()
    }

    pub fn check_chain(&self) -> Result<(), ChainFault> {
        walk(&self.blocks, self.difficulty, false)
    }

    pub fn check_chain_strict(&self) -> Result<(), ChainFault> {
        walk(&self.blocks, self.difficulty, true)
    }

    pub fn find_certificate_block(&self, id: &CertificateId) -> Option<&Block> {
        find_certificate_block(&self.blocks, id)
    }

    pub fn export(&self) -> Vec<BlockView> {
        self.blocks.iter().map(BlockView::from).collect()
    }
}

impl ChainSnapshot {
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn validate_chain(&self) -> bool {
        self.check_chain().is_ok()
    }

    pub fn check_chain(&self) -> Result<(), ChainFault> {
        walk(&self.blocks, self.difficulty, false)
    }

    pub fn check_chain_strict(&self) -> Result<(), ChainFault> {
        walk(&self.blocks, self.difficulty, true)
    }

    pub fn find_certificate_block(&self, id: &CertificateId) -> Option<&Block> {
        find_certificate_block(&self.blocks, id)
    }

    pub fn export(&self) -> Vec<BlockView> {
        self.blocks.iter().map(BlockView::from).collect()
    }
}

fn check_difficulty(difficulty: u32) -> Result<(), LedgerError> {
    if difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::InvalidDifficulty {
            difficulty,
            max: MAX_DIFFICULTY,
        });
    }
    Ok(())
}

fn find_certificate_block<'a>(blocks: &'a [Block], id: &CertificateId) -> Option<&'a Block> {
    blocks
        .iter()
        .find(|b| b.payload.certificate_id() == Some(id))
}

fn recompute(block: &Block) -> Result<String, ChainFault> {
    block.compute_hash().map_err(|e| ChainFault::Unhashable {
        index: block.index,
        reason: e.to_string(),
    })
}

// O(n) over the chain. The genesis hash and all difficulty targets are
// only examined in strict mode.
fn walk(blocks: &[Block], difficulty: u32, strict: bool) -> Result<(), ChainFault> {
    let genesis = blocks.first().ok_or(ChainFault::Empty)?;
    if genesis.index != 0 {
        return Err(ChainFault::IndexMismatch {
            position: 0,
            index: genesis.index,
        });
    }
    if strict {
        if !genesis.is_genesis() {
            return Err(ChainFault::Genesis {
                index: 0,
                reason: format!("first block carries a {} payload", genesis.payload.kind()),
            });
        }
        if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(ChainFault::Genesis {
                index: 0,
                reason: format!("genesis previous_hash is {:?}", genesis.previous_hash),
            });
        }
        let computed = recompute(genesis)?;
        if computed != genesis.hash {
            return Err(ChainFault::HashMismatch {
                index: 0,
                stored: genesis.hash.clone(),
                computed,
            });
        }
    }

    for (position, pair) in blocks.windows(2).enumerate() {
        let (prev, block) = (&pair[0], &pair[1]);
        let position = position as u64 + 1;
        if block.index != position {
            return Err(ChainFault::IndexMismatch {
                position,
                index: block.index,
            });
        }
        let computed = recompute(block)?;
        if computed != block.hash {
            return Err(ChainFault::HashMismatch {
                index: block.index,
                stored: block.hash.clone(),
                computed,
            });
        }
        if block.previous_hash != prev.hash {
            return Err(ChainFault::BrokenLink {
                index: block.index,
                expected: prev.hash.clone(),
                actual: block.previous_hash.clone(),
            });
        }
        if strict {
            if block.is_genesis() {
                return Err(ChainFault::Genesis {
                    index: block.index,
                    reason: "genesis payload after index 0".to_string(),
                });
            }
            if !block.meets_difficulty(difficulty) {
                return Err(ChainFault::DifficultyNotMet {
                    index: block.index,
                    difficulty,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use edl_core::{Certificate, CertificateBody, IdentityId, IssueDate};
    use proptest::prelude::*;

    fn issued(n: u64) -> BlockPayload {
        BlockPayload::CertificateIssued {
            certificate: Certificate::new(CertificateBody {
                id: CertificateId::from_sequence(n),
                subject: IdentityId::new("alice").unwrap(),
                issuer: IdentityId::new("inst1").unwrap(),
                course: format!("Course {n}"),
                grade: "A".into(),
                issue_date: IssueDate::from_ymd(2026, 6, 1).unwrap(),
                artifact: None,
            }),
            issuer_address: "0123456789abcdef0123".into(),
        }
    }

    fn chain(difficulty: u32, len: u64) -> Ledger {
        let mut ledger = Ledger::new(difficulty).unwrap();
        for n in 1..=len {
            ledger.append(issued(n)).unwrap();
        }
        ledger
    }

    #[test]
    fn new_ledger_has_genesis() {
        let ledger = Ledger::new(2).unwrap();
        assert_eq!(ledger.len(), 1);
        let genesis = ledger.tip();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert!(genesis.is_genesis());
        assert!(ledger.validate_chain());
        assert!(ledger.check_chain_strict().is_ok());
    }

    #[test]
    fn rejects_impossible_difficulty() {
        assert!(matches!(
            Ledger::new(MAX_DIFFICULTY + 1),
            Err(LedgerError::InvalidDifficulty { .. })
        ));
    }

    #[test]
    fn append_links_and_seals() {
        let ledger = chain(2, 3);
        assert_eq!(ledger.len(), 4);
        for pair in ledger.blocks().windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].hash);
            assert_eq!(pair[1].index, pair[0].index + 1);
            assert!(pair[1].hash.starts_with("00"));
        }
        assert!(ledger.validate_chain());
        assert!(ledger.check_chain_strict().is_ok());
    }

    #[test]
    fn payload_tamper_breaks_hash() {
        let mut ledger = chain(1, 3);
        let blocks = Arc::make_mut(&mut ledger.blocks);
        if let BlockPayload::CertificateIssued { certificate, .. } = &mut blocks[2].payload {
            certificate.set_anchor("forged").unwrap();
        }
        assert!(!ledger.validate_chain());
        assert!(matches!(
            ledger.check_chain(),
            Err(ChainFault::HashMismatch { index: 2, .. })
        ));
    }

    #[test]
    fn recomputed_hash_on_inner_block_breaks_link() {
        let mut ledger = chain(1, 3);
        let blocks = Arc::make_mut(&mut ledger.blocks);
        blocks[1].nonce += 1;
        blocks[1].hash = blocks[1].compute_hash().unwrap();
        assert!(matches!(
            ledger.check_chain(),
            Err(ChainFault::BrokenLink { index: 2, .. })
        ));
    }

    #[test]
    fn recomputed_hash_on_tip_still_validates() {
        let mut ledger = chain(1, 3);
        let blocks = Arc::make_mut(&mut ledger.blocks);
        if let BlockPayload::CertificateIssued { issuer_address, .. } = &mut blocks[3].payload {
            *issuer_address = "ffffffffffffffffffff".to_string();
        }
        blocks[3].hash = blocks[3].compute_hash().unwrap();
        assert!(ledger.validate_chain());
        assert!(ledger.check_chain().is_ok());
    }

    #[test]
    fn validate_skips_difficulty_but_strict_does_not() {
        let mut ledger = chain(0, 2);
        ledger.difficulty = 8;
        assert!(ledger.validate_chain());
        assert!(matches!(
            ledger.check_chain_strict(),
            Err(ChainFault::DifficultyNotMet { .. })
        ));
    }

    #[test]
    fn validate_does_not_rehash_genesis() {
        let mut ledger = chain(0, 1);
        let blocks = Arc::make_mut(&mut ledger.blocks);
        blocks[0].timestamp = Timestamp::parse("2000-01-01T00:00:00Z").unwrap();
        assert!(ledger.validate_chain());
        assert!(matches!(
            ledger.check_chain_strict(),
            Err(ChainFault::HashMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn commit_rejects_stale_candidate() {
        let mut ledger = Ledger::new(0).unwrap();
        let mut first = ledger.prepare(issued(1));
        let mut second = ledger.prepare(issued(2));
        seal(&mut first, 0, &SealBudget::unbounded()).unwrap();
        seal(&mut second, 0, &SealBudget::unbounded()).unwrap();
        ledger.commit(first).unwrap();
        assert!(matches!(
            ledger.commit(second),
            Err(LedgerError::StaleCandidate {
                expected: 2,
                actual: 1
            })
        ));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn commit_rejects_unsealed_or_forged() {
        let mut ledger = Ledger::new(1).unwrap();
        let unsealed = ledger.prepare(issued(1));
        assert!(matches!(
            ledger.commit(unsealed),
            Err(LedgerError::Rejected(ChainFault::HashMismatch { .. }))
        ));

        let mut genesis_again = ledger.prepare(BlockPayload::Genesis);
        seal(&mut genesis_again, 1, &SealBudget::unbounded()).unwrap();
        assert!(matches!(
            ledger.commit(genesis_again),
            Err(LedgerError::Rejected(ChainFault::Genesis { .. }))
        ));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn commit_rejects_insufficient_work() {
        let mut ledger = Ledger::new(3).unwrap();
        let mut candidate = ledger.prepare(issued(1));
        candidate.hash = candidate.compute_hash().unwrap();
        // Force a hash that starts with a non-zero nibble.
        while candidate.hash.starts_with('0') {
            candidate.nonce += 1;
            candidate.hash = candidate.compute_hash().unwrap();
        }
        assert!(matches!(
            ledger.commit(candidate),
            Err(LedgerError::Rejected(ChainFault::DifficultyNotMet { .. }))
        ));
    }

    #[test]
    fn budget_exhaustion_leaves_chain_untouched() {
        let mut ledger = Ledger::new(8)
            .unwrap()
            .with_budget(SealBudget::new(10, None));
        let before = ledger.tip().hash.clone();
        assert!(matches!(
            ledger.append(issued(1)),
            Err(LedgerError::SealBudgetExhausted { .. })
        ));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.tip().hash, before);
    }

    #[test]
    fn snapshots_are_isolated_from_later_appends() {
        let mut ledger = chain(0, 1);
        let snap = ledger.snapshot();
        ledger.append(issued(2)).unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(ledger.len(), 3);
        assert!(snap.validate_chain());
        assert_eq!(snap.tip().index, 1);
    }

    #[test]
    fn find_and_export() {
        let ledger = chain(0, 2);
        let block = ledger
            .find_certificate_block(&CertificateId::from_sequence(2))
            .unwrap();
        assert_eq!(block.index, 2);
        assert!(ledger
            .find_certificate_block(&CertificateId::unchecked("UNKNOWN"))
            .is_none());

        let export = ledger.export();
        assert_eq!(export.len(), 3);
        assert_eq!(export[0].payload_kind, "genesis");
        assert_eq!(export[1].payload_kind, "certificate_issued");
        assert_eq!(export[2].hash, ledger.tip().hash);
        let json = serde_json::to_value(&export[1]).unwrap();
        assert_eq!(json["payload"]["type"], "certificate_issued");
        assert_eq!(json["payload"]["certificate"]["id"], "CERT-0001");
    }

    #[test]
    fn from_blocks_rejects_empty() {
        assert!(matches!(
            Ledger::from_blocks(Vec::new(), 2),
            Err(LedgerError::Rejected(ChainFault::Empty))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn appended_chains_validate(difficulty in 0u32..=2, len in 0u64..5) {
            let ledger = chain(difficulty, len);
            prop_assert_eq!(ledger.len() as u64, len + 1);
            prop_assert!(ledger.validate_chain());
            prop_assert!(ledger.check_chain_strict().is_ok());
        }
    }
}
