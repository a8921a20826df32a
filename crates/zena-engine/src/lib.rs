//! # zena-engine
//!
//! Proof-of-authority consensus engine with producer rotation over a
//! weighted validator set.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **ConsensusEngine**: header authoring, verification, difficulty from
//!   rotation position, span transitions, sprint hooks, sealing
//! - **SystemCaller**: synthetic-sender messages into the two system
//!   contracts through the `EvmRunner` outbound port
//! - **Spanner**: span reads, producer resolution with legacy fallback,
//!   span commits
//! - **StateSyncCommitter**: gap-checked ordered event application
//!
//! ## Architecture
//!
//! ```text
//! block driver ──prepare/verify/finalize/seal──→ ConsensusEngine
//!                                                   │
//!                       ┌── Spanner ────────────────┤
//!                       ├── StateSyncCommitter ─────┤
//!                       │        │                  └──→ OracleClient
//!                       └── SystemCaller ──→ EvmRunner (execution layer)
//! ```

pub mod abi;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod spanner;
pub mod state_sync;
pub mod system_caller;

#[cfg(test)]
mod testutil;

pub use config::{EngineConfig, DEFAULT_SPAN_SIZE};
pub use domain::signer::{recover_signer, Signer};
pub use domain::BlockPhase;
pub use error::{EngineError, EngineResult};
pub use ports::outbound::{CallOutcome, EvmRunner, SystemCall};
pub use service::ConsensusEngine;
pub use spanner::Spanner;
pub use state_sync::StateSyncCommitter;
pub use system_caller::{system_address, SystemCaller, SYSTEM_CALL_GAS};
