//! Error types for the oracle client.

use std::time::Duration;
use thiserror::Error;

/// Transport-level status codes shared by the gRPC and HTTP variants.
///
/// The retryable subset is configuration-driven; see
/// [`crate::config::OracleConfig::retry_codes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TransportCode {
    Internal,
    Unavailable,
    Aborted,
    NotFound,
    DeadlineExceeded,
    InvalidArgument,
    Unknown,
}

/// Oracle client errors.
///
/// Transient errors (`Timeout`, `Unavailable`, retryable `Transport` codes)
/// advance the circuit breaker and may be retried; informational returns
/// (`NotInRejectedList`, `NotInMilestoneList`) and lookup misses do not.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The per-call deadline elapsed before the oracle answered.
    #[error("oracle request timed out after {0:?}")]
    Timeout(Duration),

    /// The oracle endpoint could not be reached.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// The circuit breaker is open; the call was not attempted.
    #[error("oracle circuit open")]
    CircuitOpen,

    /// Transport-level failure with a status code.
    #[error("oracle transport error ({code:?}): {message}")]
    Transport {
        code: TransportCode,
        message: String,
    },

    /// No-ack lookup: the milestone id is not in the rejected list.
    #[error("milestone id {0:?} is not in the rejected list")]
    NotInRejectedList(String),

    /// Milestone-id lookup: the id is not the in-flight milestone.
    #[error("milestone id {0:?} is not in the milestone list")]
    NotInMilestoneList(String),

    /// Span lookup miss.
    #[error("span {0} not found")]
    SpanNotFound(u64),

    /// Checkpoint lookup miss.
    #[error("checkpoint {0} not found")]
    CheckpointNotFound(i64),

    /// Milestone lookup miss.
    #[error("milestone not found")]
    MilestoneNotFound,

    /// The oracle answered with something we could not decode.
    #[error("malformed oracle response: {0}")]
    Decode(String),

    /// The client has been closed.
    #[error("oracle client closed")]
    Closed,
}

impl OracleError {
    /// Transport code carried by this error, if any.
    pub fn transport_code(&self) -> Option<TransportCode> {
        match self {
            OracleError::Transport { code, .. } => Some(*code),
            OracleError::Unavailable(_) => Some(TransportCode::Unavailable),
            OracleError::Timeout(_) => Some(TransportCode::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether this error reflects a transient condition that should count
    /// against the circuit breaker.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OracleError::Timeout(_)
                | OracleError::Unavailable(_)
                | OracleError::Transport { .. }
        )
    }
}

/// Result type for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;
