//! LRU cache for idempotent oracle lookups.
//!
//! Cached: `span`, `checkpoint(n >= 0)`, `checkpoint_count`,
//! `milestone_count`, `no_ack_milestone(id)`, `milestone_id(id)`.
//! Latest-checkpoint and latest-milestone fetches are never cached.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use zena_types::{Checkpoint, OracleSpan};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum CacheKey {
    Span(u64),
    Checkpoint(i64),
    CheckpointCount,
    MilestoneCount,
    NoAckMilestone(String),
    MilestoneId(String),
}

#[derive(Clone, Debug)]
pub(crate) enum CacheValue {
    Span(OracleSpan),
    Checkpoint(Checkpoint),
    Count(u64),
    /// A confirmed membership answer (no-ack / in-flight milestone id).
    Confirmed,
}

/// Fixed-capacity LRU shared by all idempotent lookups.
pub(crate) struct OracleCache {
    entries: Mutex<LruCache<CacheKey, CacheValue>>,
}

impl OracleCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.entries.lock().get(key).cloned()
    }

    pub fn put(&self, key: CacheKey, value: CacheValue) {
        self.entries.lock().put(key, value);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
