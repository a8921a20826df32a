//! Engine error types.

use thiserror::Error;
use zena_oracle::OracleError;
use zena_types::Address;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Structural header defect. Rejects the block.
    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    /// Recovered signer is not in the active validator set.
    #[error("unauthorized signer {signer}")]
    UnauthorizedSigner { signer: Address },

    /// Header difficulty does not match the signer's rotation position.
    #[error("bad difficulty: header {header}, expected {expected}")]
    BadDifficulty { header: u64, expected: u64 },

    /// Sealing cannot proceed; production is skipped for this block.
    #[error("seal error: {0}")]
    Seal(String),

    /// State-sync ids must ascend without holes.
    #[error("event sequence gap: expected id {expected}, got {got}")]
    EventSequenceGap { expected: u64, got: u64 },

    /// System-contract call failed inside the EVM.
    #[error("system call to {contract} failed: {message}")]
    SystemCall { contract: Address, message: String },

    /// Return data did not decode as the expected ABI shape.
    #[error("abi decode: {0}")]
    AbiDecode(String),

    /// Signature creation or recovery failed.
    #[error("signature: {0}")]
    Signature(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl EngineError {
    fn invalid_header(reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            reason: reason.into(),
        }
    }

    /// Transient faults never fail a block; the caller logs and moves on.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Oracle(e) if e.is_transient())
    }
}

pub(crate) fn invalid_header(reason: impl Into<String>) -> EngineError {
    EngineError::invalid_header(reason)
}
