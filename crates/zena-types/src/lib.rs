//! # zena-types
//!
//! Shared domain entities for the Zena consensus crates.
//!
//! ## Overview
//!
//! This crate is the single source of truth for the types that cross
//! subsystem boundaries:
//!
//! - **Header**: EVM-style block header with the PoA extra-data layout
//! - **Validator / ValidatorSet**: weighted set with proposer-priority
//!   rotation (Tendermint-style selection)
//! - **Span / OracleSpan**: contiguous block ranges with their authoritative
//!   validator set
//! - **Checkpoint / Milestone**: attestations from the external finality
//!   oracle
//! - **EventRecord**: root-chain state-sync events
//!
//! Subsystem-specific types (oracle DTOs, engine configuration, whitelist
//! entries) live in their own crates.

pub mod checkpoint;
pub mod event;
pub mod header;
pub mod span;
pub mod validator;

pub use checkpoint::{Checkpoint, Milestone};
pub use event::EventRecord;
pub use header::{encode_extra, Header, EXTRA_SEAL, EXTRA_VANITY};
pub use span::{OracleSpan, Span};
pub use validator::{Validator, ValidatorSet, VALIDATOR_ENTRY_BYTES};

use primitive_types::{H160, H256};
use sha3::{Digest, Keccak256};

/// 20-byte account address.
pub type Address = H160;

/// 32-byte Keccak-256 hash.
pub type Hash = H256;

/// Compute the Keccak-256 hash of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash::from_slice(&hasher.finalize())
}

/// Compute the Keccak-256 hash of a concatenation of byte slices.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    Hash::from_slice(&hasher.finalize())
}
