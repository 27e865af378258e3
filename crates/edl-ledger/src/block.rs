//! # Blocks
//!
//! A block's hash is the SHA-256 of the canonical form of
//! `{index, timestamp, payload, previous_hash, nonce}`. The stored `hash`
//! field is excluded from its own input.

use edl_core::{
    leading_zero_nibbles, sha256_hex, CanonicalBytes, CanonicalizationError, Certificate,
    CertificateId, Timestamp,
};
use serde::{Deserialize, Serialize};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// What a block records. Closed set; the `type` tag is part of the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockPayload {
    Genesis,
    CertificateIssued {
        certificate: Certificate,
        issuer_address: String,
    },
}

impl BlockPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Genesis => "genesis",
            Self::CertificateIssued { .. } => "certificate_issued",
        }
    }

    /// The certificate id carried by this payload, if any.
    pub fn certificate_id(&self) -> Option<&CertificateId> {
        match self {
            Self::Genesis => None,
            Self::CertificateIssued { certificate, .. } => Some(certificate.id()),
        }
    }
}

/// One link in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: Timestamp,
    pub payload: BlockPayload,
    pub previous_hash: String,
    pub nonce: u64,
    /// 64 lowercase hex characters once sealed; empty on a fresh candidate.
    pub hash: String,
}

#[derive(Serialize)]
struct HashInput<'a> {
    index: u64,
    timestamp: &'a Timestamp,
    payload: &'a BlockPayload,
    previous_hash: &'a str,
    nonce: u64,
}

impl Block {
    /// The genesis block. Never mined: its hash is computed at nonce 0.
    pub fn genesis(timestamp: Timestamp) -> Result<Self, CanonicalizationError> {
        let mut block = Self::candidate(0, timestamp, BlockPayload::Genesis, GENESIS_PREVIOUS_HASH);
        block.hash = block.compute_hash()?;
        Ok(block)
    }

    /// An unsealed block at nonce 0 with an empty hash.
    pub fn candidate(
        index: u64,
        timestamp: Timestamp,
        payload: BlockPayload,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp,
            payload,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        }
    }

    /// Canonical bytes of the hashed fields at the current nonce.
    pub fn hash_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(&HashInput {
            index: self.index,
            timestamp: &self.timestamp,
            payload: &self.payload,
            previous_hash: &self.previous_hash,
            nonce: self.nonce,
        })
    }

    /// Recompute the hash from the block's current contents.
    pub fn compute_hash(&self) -> Result<String, CanonicalizationError> {
        Ok(sha256_hex(&self.hash_input()?))
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        leading_zero_nibbles(&self.hash) >= difficulty
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self.payload, BlockPayload::Genesis)
    }
}
