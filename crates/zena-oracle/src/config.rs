//! Oracle client configuration.

use crate::error::TransportCode;
use serde::Deserialize;
use std::time::Duration;

/// Default per-call state-sync fetch limit.
pub const DEFAULT_STATE_FETCH_LIMIT: u64 = 50;

/// Runtime configuration for the oracle client.
///
/// `url` selects the JSON-RPC variant, `grpc_address` the stream-gRPC
/// variant, `without_oracle` the embedded keeper. Exactly one should be set;
/// `without_oracle` wins when several are.
#[derive(Clone, Debug, Deserialize)]
pub struct OracleConfig {
    /// JSON-RPC endpoint, e.g. `http://localhost:1317`.
    pub url: Option<String>,

    /// gRPC endpoint, e.g. `http://localhost:3131`.
    pub grpc_address: Option<String>,

    /// Run against the in-process keeper instead of a remote service.
    pub without_oracle: bool,

    /// Maximum event records returned per `state_sync_events` call.
    pub state_fetch_limit: u64,

    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,

    /// Linear backoff step between retries, seconds.
    pub retry_backoff_secs: u64,

    /// Maximum attempts per call. Large because the oracle may be restarted
    /// many times during a node's life.
    pub max_attempts: u32,

    /// Transport codes considered transient and retried.
    pub retry_codes: Vec<TransportCode>,

    /// Consecutive failures before the circuit breaker opens.
    pub circuit_breaker_threshold: u32,

    /// Seconds the breaker stays open before a half-open probe.
    pub circuit_breaker_reset_secs: u64,

    /// LRU capacity for idempotent lookups.
    pub cache_size: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            url: None,
            grpc_address: None,
            without_oracle: false,
            state_fetch_limit: DEFAULT_STATE_FETCH_LIMIT,
            request_timeout_secs: 5,
            retry_backoff_secs: 5,
            max_attempts: 10_000,
            retry_codes: vec![
                TransportCode::Internal,
                TransportCode::Unavailable,
                TransportCode::Aborted,
                TransportCode::NotFound,
            ],
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
            cache_size: 100,
        }
    }
}

impl OracleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn circuit_breaker_reset(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_reset_secs)
    }

    /// Whether an error with this code should be retried.
    pub fn is_retryable(&self, code: TransportCode) -> bool {
        self.retry_codes.contains(&code)
    }
}
