//! The `OracleClient` capability set.

use crate::error::OracleResult;
use async_trait::async_trait;
use zena_types::{Checkpoint, EventRecord, Milestone, OracleSpan};

/// Fetching `fetch_checkpoint(LATEST_CHECKPOINT)` returns the newest
/// checkpoint known to the oracle.
pub const LATEST_CHECKPOINT: i64 = -1;

/// Client to the external Iris finality/span oracle.
///
/// All variants (stream-gRPC, JSON-RPC, embedded keeper) expose this trait;
/// resilience concerns (timeouts, retries, circuit breaking, caching) are
/// lifted into [`crate::resilient::ResilientClient`] so every variant
/// benefits from them.
#[async_trait]
pub trait OracleClient: Send + Sync {
    /// Fetch the span with the given id, including its validator set and
    /// selected producers.
    async fn span(&self, id: u64) -> OracleResult<OracleSpan>;

    /// Fetch state-sync event records with `id >= from_id` and
    /// `time <= to_time`, ascending by id, capped at the service's
    /// per-call fetch limit. All pages streamed for one call are returned;
    /// fetching further records is the caller's job via a higher `from_id`.
    async fn state_sync_events(
        &self,
        from_id: u64,
        to_time: u64,
    ) -> OracleResult<Vec<EventRecord>>;

    /// Fetch checkpoint `number` (1-based), or the latest for
    /// [`LATEST_CHECKPOINT`].
    async fn fetch_checkpoint(&self, number: i64) -> OracleResult<Checkpoint>;

    /// Total number of checkpoints the oracle has seen.
    async fn fetch_checkpoint_count(&self) -> OracleResult<u64>;

    /// Fetch the latest milestone.
    async fn fetch_milestone(&self) -> OracleResult<Milestone>;

    /// Total number of milestones the oracle has seen.
    async fn fetch_milestone_count(&self) -> OracleResult<u64>;

    /// Succeeds iff `milestone_id` is in the oracle's rejected (no-ack)
    /// list; otherwise fails with
    /// [`crate::OracleError::NotInRejectedList`].
    async fn fetch_no_ack_milestone(&self, milestone_id: &str) -> OracleResult<()>;

    /// Id of the most recently rejected milestone.
    async fn fetch_last_no_ack_milestone(&self) -> OracleResult<String>;

    /// Succeeds iff `milestone_id` is the milestone currently in flight;
    /// otherwise fails with [`crate::OracleError::NotInMilestoneList`].
    async fn fetch_milestone_id(&self, milestone_id: &str) -> OracleResult<()>;

    /// Release the underlying transport. Calls made after `close` fail with
    /// [`crate::OracleError::Closed`].
    async fn close(&self);
}

#[async_trait]
impl<T: OracleClient + ?Sized> OracleClient for std::sync::Arc<T> {
    async fn span(&self, id: u64) -> OracleResult<OracleSpan> {
        (**self).span(id).await
    }

    async fn state_sync_events(
        &self,
        from_id: u64,
        to_time: u64,
    ) -> OracleResult<Vec<EventRecord>> {
        (**self).state_sync_events(from_id, to_time).await
    }

    async fn fetch_checkpoint(&self, number: i64) -> OracleResult<Checkpoint> {
        (**self).fetch_checkpoint(number).await
    }

    async fn fetch_checkpoint_count(&self) -> OracleResult<u64> {
        (**self).fetch_checkpoint_count().await
    }

    async fn fetch_milestone(&self) -> OracleResult<Milestone> {
        (**self).fetch_milestone().await
    }

    async fn fetch_milestone_count(&self) -> OracleResult<u64> {
        (**self).fetch_milestone_count().await
    }

    async fn fetch_no_ack_milestone(&self, milestone_id: &str) -> OracleResult<()> {
        (**self).fetch_no_ack_milestone(milestone_id).await
    }

    async fn fetch_last_no_ack_milestone(&self) -> OracleResult<String> {
        (**self).fetch_last_no_ack_milestone().await
    }

    async fn fetch_milestone_id(&self, milestone_id: &str) -> OracleResult<()> {
        (**self).fetch_milestone_id(milestone_id).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
