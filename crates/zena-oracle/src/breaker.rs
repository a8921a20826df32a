//! Circuit breaker for the oracle transport.
//!
//! Failures increment a counter; at the threshold the breaker opens and
//! calls fail fast with `CircuitOpen` until the reset timeout has elapsed
//! since the last failure, at which point the next call passes through as a
//! half-open probe. A success closes the breaker and zeroes the counter.

use crate::error::{OracleError, OracleResult};
use parking_lot::RwLock;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
struct BreakerState {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Count-and-timer circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    reset: Duration,
    state: RwLock<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, reset: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            reset,
            state: RwLock::new(BreakerState {
                consecutive_failures: 0,
                last_failure: None,
            }),
        }
    }

    /// Gate a call. `Err(CircuitOpen)` while open; `Ok` when closed or when
    /// the reset timeout has elapsed (half-open probe).
    pub fn check(&self) -> OracleResult<()> {
        let state = self.state.read();
        if state.consecutive_failures < self.threshold {
            return Ok(());
        }
        match state.last_failure {
            Some(at) if at.elapsed() < self.reset => Err(OracleError::CircuitOpen),
            _ => Ok(()),
        }
    }

    /// Whether the breaker is currently rejecting calls.
    pub fn is_open(&self) -> bool {
        self.check().is_err()
    }

    pub fn record_success(&self) {
        let mut state = self.state.write();
        state.consecutive_failures = 0;
        state.last_failure = None;
    }

    pub fn record_failure(&self) {
        let mut state = self.state.write();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_failure = Some(Instant::now());
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.read().consecutive_failures
    }
}
