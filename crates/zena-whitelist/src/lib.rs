//! # zena-whitelist
//!
//! Finality whitelist for the consensus engine.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **WhitelistGatekeeper**: latest verified checkpoint and milestone
//!   slots, the sprint lock shared with the block downloader, and the
//!   milestone vote-on-hash decision
//! - **FinalityFetcher**: background loops fetching oracle checkpoints and
//!   milestones, verifying them against the local chain (Merkle root over
//!   header hashes for checkpoints, direct hash for milestones) and
//!   installing them through the gatekeeper
//!
//! ## Architecture
//!
//! ```text
//! Iris oracle ──fetch──→ FinalityFetcher ──verify──→ ChainReader
//!                              │
//!                              └──install/lock──→ WhitelistGatekeeper ←── downloader
//! ```

pub mod error;
pub mod fetcher;
pub mod gatekeeper;
pub mod ports;

pub use error::{WhitelistError, WhitelistResult};
pub use fetcher::{merkle_root, FinalityFetcher};
pub use gatekeeper::{WhitelistGatekeeper, CONFIRMATION_DEPTH};
pub use ports::ChainReader;
