//! Whitelist error types.

use thiserror::Error;
use zena_oracle::OracleError;

pub type WhitelistResult<T> = Result<T, WhitelistError>;

#[derive(Debug, Error)]
pub enum WhitelistError {
    /// Local head is below the finality entry's end block. Defer and retry.
    #[error("chain out of sync: local head {local_head}, need block {needed}")]
    ChainOutOfSync { local_head: u64, needed: u64 },

    /// Local chain disagrees with the finality entry. The node is on a
    /// wrong fork and must reorg before accepting.
    #[error("hash mismatch at block {number}")]
    HashMismatch { number: u64 },

    /// Confirmation-depth block past the voted milestone is absent.
    #[error("no confirmation block at {number}")]
    TipConfirmationBlock { number: u64 },

    /// Voted milestone end block is absent.
    #[error("no block at milestone end {number}")]
    EndBlock { number: u64 },

    /// Gatekeeper is locked or whitelisted past the voted end block.
    #[error("whitelist already ahead of block {number}")]
    WhitelistedAhead { number: u64 },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl WhitelistError {
    /// Deferrable conditions keep the loop ticking without noise.
    pub fn is_deferrable(&self) -> bool {
        matches!(self, Self::ChainOutOfSync { .. })
            || matches!(self, Self::Oracle(e) if e.is_transient())
    }
}
