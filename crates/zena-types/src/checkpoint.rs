//! Checkpoints and milestones: attestations from the external finality
//! oracle.
//!
//! A checkpoint attests a Merkle root over a coarse header range; a
//! milestone attests the exact hash of a single block and carries a string
//! id used by the two-phase no-ack protocol.

use crate::{Address, Hash};
use serde::{Deserialize, Serialize};

/// Root-chain attestation of a canonical header range `[start, end]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub proposer: Address,
    pub start_block: u64,
    pub end_block: u64,
    /// Merkle root over the header hashes in `[start_block, end_block]`.
    pub root_hash: Hash,
    pub chain_id: String,
    pub timestamp: u64,
}

/// Fine-grained attestation of a single canonical block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub proposer: Address,
    pub start_block: u64,
    pub end_block: u64,
    /// Hash of the header at `end_block`.
    pub hash: Hash,
    pub chain_id: String,
    pub timestamp: u64,
    pub milestone_id: String,
}
