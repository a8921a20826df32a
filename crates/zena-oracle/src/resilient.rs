//! Resilience decorator over any [`OracleClient`] variant.
//!
//! Lifts the transport concerns out of the individual variants: per-call
//! timeouts, linear-backoff retries on the configured transient codes, a
//! circuit breaker, and an LRU cache for idempotent lookups.

use crate::breaker::CircuitBreaker;
use crate::cache::{CacheKey, CacheValue, OracleCache};
use crate::client::{OracleClient, LATEST_CHECKPOINT};
use crate::config::OracleConfig;
use crate::error::{OracleError, OracleResult};
use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, warn};
use zena_types::{Checkpoint, EventRecord, Milestone, OracleSpan};

/// Decorated oracle client.
pub struct ResilientClient<C> {
    inner: C,
    config: OracleConfig,
    breaker: CircuitBreaker,
    cache: OracleCache,
}

impl<C: OracleClient> ResilientClient<C> {
    pub fn new(inner: C, config: OracleConfig) -> Self {
        let breaker = CircuitBreaker::new(
            config.circuit_breaker_threshold,
            config.circuit_breaker_reset(),
        );
        let cache = OracleCache::new(config.cache_size);
        Self {
            inner,
            config,
            breaker,
            cache,
        }
    }

    /// Whether the breaker currently rejects calls.
    pub fn is_circuit_open(&self) -> bool {
        self.breaker.is_open()
    }

    /// Run one oracle operation through the breaker, the per-call timeout
    /// and the retry loop.
    async fn call<T, F, Fut>(&self, op: &'static str, f: F) -> OracleResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = OracleResult<T>>,
    {
        let timeout = self.config.request_timeout();
        let mut attempt = 1u32;
        loop {
            self.breaker.check()?;

            let result = match tokio::time::timeout(timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(OracleError::Timeout(timeout)),
            };

            match result {
                Ok(value) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(err) if err.is_transient() => {
                    self.breaker.record_failure();
                    let retryable = err
                        .transport_code()
                        .map(|code| self.config.is_retryable(code))
                        .unwrap_or(false);
                    if !retryable || attempt >= self.config.max_attempts {
                        warn!(op, attempt, error = %err, "oracle call failed");
                        return Err(err);
                    }
                    debug!(op, attempt, error = %err, "retrying oracle call");
                    attempt += 1;
                    // Linear backoff: a fixed step between attempts.
                    tokio::time::sleep(self.config.retry_backoff()).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<C: OracleClient> OracleClient for ResilientClient<C> {
    async fn span(&self, id: u64) -> OracleResult<OracleSpan> {
        let key = CacheKey::Span(id);
        if let Some(CacheValue::Span(span)) = self.cache.get(&key) {
            return Ok(span);
        }
        let span = self.call("span", || self.inner.span(id)).await?;
        self.cache.put(key, CacheValue::Span(span.clone()));
        Ok(span)
    }

    async fn state_sync_events(
        &self,
        from_id: u64,
        to_time: u64,
    ) -> OracleResult<Vec<EventRecord>> {
        // Never cached: the record set grows between calls.
        self.call("state_sync_events", || {
            self.inner.state_sync_events(from_id, to_time)
        })
        .await
    }

    async fn fetch_checkpoint(&self, number: i64) -> OracleResult<Checkpoint> {
        if number == LATEST_CHECKPOINT {
            return self
                .call("fetch_checkpoint", || self.inner.fetch_checkpoint(number))
                .await;
        }
        let key = CacheKey::Checkpoint(number);
        if let Some(CacheValue::Checkpoint(checkpoint)) = self.cache.get(&key) {
            return Ok(checkpoint);
        }
        let checkpoint = self
            .call("fetch_checkpoint", || self.inner.fetch_checkpoint(number))
            .await?;
        self.cache
            .put(key, CacheValue::Checkpoint(checkpoint.clone()));
        Ok(checkpoint)
    }

    async fn fetch_checkpoint_count(&self) -> OracleResult<u64> {
        let key = CacheKey::CheckpointCount;
        if let Some(CacheValue::Count(count)) = self.cache.get(&key) {
            return Ok(count);
        }
        let count = self
            .call("fetch_checkpoint_count", || {
                self.inner.fetch_checkpoint_count()
            })
            .await?;
        self.cache.put(key, CacheValue::Count(count));
        Ok(count)
    }

    async fn fetch_milestone(&self) -> OracleResult<Milestone> {
        // The latest milestone moves with the oracle head; never cached.
        self.call("fetch_milestone", || self.inner.fetch_milestone())
            .await
    }

    async fn fetch_milestone_count(&self) -> OracleResult<u64> {
        let key = CacheKey::MilestoneCount;
        if let Some(CacheValue::Count(count)) = self.cache.get(&key) {
            return Ok(count);
        }
        let count = self
            .call("fetch_milestone_count", || {
                self.inner.fetch_milestone_count()
            })
            .await?;
        self.cache.put(key, CacheValue::Count(count));
        Ok(count)
    }

    async fn fetch_no_ack_milestone(&self, milestone_id: &str) -> OracleResult<()> {
        let key = CacheKey::NoAckMilestone(milestone_id.to_string());
        if let Some(CacheValue::Confirmed) = self.cache.get(&key) {
            return Ok(());
        }
        self.call("fetch_no_ack_milestone", || {
            self.inner.fetch_no_ack_milestone(milestone_id)
        })
        .await?;
        // Rejection is final, so a confirmed answer can be cached.
        self.cache.put(key, CacheValue::Confirmed);
        Ok(())
    }

    async fn fetch_last_no_ack_milestone(&self) -> OracleResult<String> {
        self.call("fetch_last_no_ack_milestone", || {
            self.inner.fetch_last_no_ack_milestone()
        })
        .await
    }

    async fn fetch_milestone_id(&self, milestone_id: &str) -> OracleResult<()> {
        let key = CacheKey::MilestoneId(milestone_id.to_string());
        if let Some(CacheValue::Confirmed) = self.cache.get(&key) {
            return Ok(());
        }
        self.call("fetch_milestone_id", || {
            self.inner.fetch_milestone_id(milestone_id)
        })
        .await?;
        self.cache.put(key, CacheValue::Confirmed);
        Ok(())
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}
