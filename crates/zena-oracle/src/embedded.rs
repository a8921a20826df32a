//! In-process oracle variant.
//!
//! Backs the `without_oracle` configuration: a local keeper answering the
//! full capability set from in-memory state. No timeouts, retries or
//! breaker needed; the resilience decorator still composes over it.

use crate::client::{OracleClient, LATEST_CHECKPOINT};
use crate::config::DEFAULT_STATE_FETCH_LIMIT;
use crate::error::{OracleError, OracleResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use zena_types::{Checkpoint, EventRecord, Milestone, OracleSpan};

#[derive(Default)]
struct KeeperState {
    spans: BTreeMap<u64, OracleSpan>,
    checkpoints: Vec<Checkpoint>,
    milestones: Vec<Milestone>,
    events: BTreeMap<u64, EventRecord>,
    rejected_milestone_ids: Vec<String>,
    in_flight_milestone_id: Option<String>,
}

/// Embedded keeper client.
pub struct EmbeddedClient {
    state: RwLock<KeeperState>,
    state_fetch_limit: u64,
    closed: AtomicBool,
}

impl EmbeddedClient {
    pub fn new() -> Self {
        Self::with_fetch_limit(DEFAULT_STATE_FETCH_LIMIT)
    }

    pub fn with_fetch_limit(state_fetch_limit: u64) -> Self {
        Self {
            state: RwLock::new(KeeperState::default()),
            state_fetch_limit: state_fetch_limit.max(1),
            closed: AtomicBool::new(false),
        }
    }

    // ---- keeper mutation -------------------------------------------------

    pub fn insert_span(&self, span: OracleSpan) {
        self.state.write().spans.insert(span.span.id, span);
    }

    pub fn push_checkpoint(&self, checkpoint: Checkpoint) {
        self.state.write().checkpoints.push(checkpoint);
    }

    pub fn push_milestone(&self, milestone: Milestone) {
        let mut state = self.state.write();
        state.in_flight_milestone_id = Some(milestone.milestone_id.clone());
        state.milestones.push(milestone);
    }

    pub fn insert_event(&self, event: EventRecord) {
        self.state.write().events.insert(event.id, event);
    }

    pub fn reject_milestone(&self, milestone_id: impl Into<String>) {
        let mut state = self.state.write();
        let id = milestone_id.into();
        if state.in_flight_milestone_id.as_deref() == Some(id.as_str()) {
            state.in_flight_milestone_id = None;
        }
        state.rejected_milestone_ids.push(id);
    }

    fn ensure_open(&self) -> OracleResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(OracleError::Closed);
        }
        Ok(())
    }
}

impl Default for EmbeddedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OracleClient for EmbeddedClient {
    async fn span(&self, id: u64) -> OracleResult<OracleSpan> {
        self.ensure_open()?;
        self.state
            .read()
            .spans
            .get(&id)
            .cloned()
            .ok_or(OracleError::SpanNotFound(id))
    }

    async fn state_sync_events(
        &self,
        from_id: u64,
        to_time: u64,
    ) -> OracleResult<Vec<EventRecord>> {
        self.ensure_open()?;
        let state = self.state.read();
        Ok(state
            .events
            .range(from_id..)
            .map(|(_, e)| e)
            .filter(|e| e.time <= to_time)
            .take(self.state_fetch_limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_checkpoint(&self, number: i64) -> OracleResult<Checkpoint> {
        self.ensure_open()?;
        let state = self.state.read();
        let checkpoint = if number == LATEST_CHECKPOINT {
            state.checkpoints.last()
        } else if number >= 1 {
            state.checkpoints.get(number as usize - 1)
        } else {
            None
        };
        checkpoint
            .cloned()
            .ok_or(OracleError::CheckpointNotFound(number))
    }

    async fn fetch_checkpoint_count(&self) -> OracleResult<u64> {
        self.ensure_open()?;
        Ok(self.state.read().checkpoints.len() as u64)
    }

    async fn fetch_milestone(&self) -> OracleResult<Milestone> {
        self.ensure_open()?;
        self.state
            .read()
            .milestones
            .last()
            .cloned()
            .ok_or(OracleError::MilestoneNotFound)
    }

    async fn fetch_milestone_count(&self) -> OracleResult<u64> {
        self.ensure_open()?;
        Ok(self.state.read().milestones.len() as u64)
    }

    async fn fetch_no_ack_milestone(&self, milestone_id: &str) -> OracleResult<()> {
        self.ensure_open()?;
        let state = self.state.read();
        if state
            .rejected_milestone_ids
            .iter()
            .any(|id| id == milestone_id)
        {
            Ok(())
        } else {
            Err(OracleError::NotInRejectedList(milestone_id.to_string()))
        }
    }

    async fn fetch_last_no_ack_milestone(&self) -> OracleResult<String> {
        self.ensure_open()?;
        self.state
            .read()
            .rejected_milestone_ids
            .last()
            .cloned()
            .ok_or(OracleError::MilestoneNotFound)
    }

    async fn fetch_milestone_id(&self, milestone_id: &str) -> OracleResult<()> {
        self.ensure_open()?;
        let state = self.state.read();
        if state.in_flight_milestone_id.as_deref() == Some(milestone_id) {
            Ok(())
        } else {
            Err(OracleError::NotInMilestoneList(milestone_id.to_string()))
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
