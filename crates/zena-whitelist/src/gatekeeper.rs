//! Whitelist slots and the downloader lock protocol.

use crate::error::{WhitelistError, WhitelistResult};
use crate::ports::ChainReader;
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use zena_types::Hash;

/// Blocks that must exist past a voted milestone end before the vote counts.
pub const CONFIRMATION_DEPTH: u64 = 16;

#[derive(Default)]
struct MilestoneSlot {
    entry: Option<(u64, Hash)>,
    locked: bool,
    locked_end_block: u64,
    /// Ids of accepted future milestones still awaiting finality; the
    /// no-ack loop prunes rejected ones, and the lock drops when the set
    /// empties.
    milestone_ids: HashSet<String>,
}

impl MilestoneSlot {
    // Highest block the slot refuses to go behind.
    fn tip(&self) -> u64 {
        let entry_tip = self.entry.map(|(n, _)| n).unwrap_or(0);
        if self.locked {
            entry_tip.max(self.locked_end_block)
        } else {
            entry_tip
        }
    }
}

/// Latest verified checkpoint and milestone, plus the sprint lock shared
/// with the block downloader.
#[derive(Default)]
pub struct WhitelistGatekeeper {
    checkpoint: Mutex<Option<(u64, Hash)>>,
    milestone: Mutex<MilestoneSlot>,
}

impl WhitelistGatekeeper {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- checkpoint slot -------------------------------------------------

    /// Installs a checkpoint entry. Stale numbers are a no-op.
    pub fn put_checkpoint(&self, number: u64, hash: Hash) -> bool {
        let mut slot = self.checkpoint.lock();
        if let Some((current, _)) = *slot {
            if number <= current {
                debug!(number, current, "stale checkpoint ignored");
                return false;
            }
        }
        info!(number, %hash, "checkpoint whitelisted");
        *slot = Some((number, hash));
        true
    }

    pub fn get_checkpoint(&self) -> Option<(u64, Hash)> {
        *self.checkpoint.lock()
    }

    pub fn purge_checkpoint(&self) {
        *self.checkpoint.lock() = None;
    }

    // ---- milestone slot --------------------------------------------------

    pub fn put_milestone(&self, number: u64, hash: Hash) -> bool {
        let mut slot = self.milestone.lock();
        if let Some((current, _)) = slot.entry {
            if number <= current {
                debug!(number, current, "stale milestone ignored");
                return false;
            }
        }
        info!(number, %hash, "milestone whitelisted");
        slot.entry = Some((number, hash));
        true
    }

    pub fn get_milestone(&self) -> Option<(u64, Hash)> {
        self.milestone.lock().entry
    }

    pub fn purge_milestone(&self) {
        let mut slot = self.milestone.lock();
        slot.entry = None;
    }

    // ---- downloader lock protocol ---------------------------------------

    /// Takes the sprint lock for a candidate milestone ending at
    /// `end_block`. Refuses to move backwards past the whitelisted tip or
    /// an existing lock.
    pub fn lock_sprint(&self, end_block: u64) -> bool {
        let mut slot = self.milestone.lock();
        if end_block <= slot.tip() {
            debug!(end_block, tip = slot.tip(), "sprint lock refused");
            return false;
        }
        slot.locked = true;
        slot.locked_end_block = end_block;
        true
    }

    /// Resolves a sprint lock. Accepted milestones install atomically and
    /// keep the lock alive until their id clears the no-ack list; rejected
    /// ones release with no whitelist change.
    pub fn unlock_sprint(&self, accepted: bool, milestone_id: &str, end_block: u64, hash: Hash) {
        let mut slot = self.milestone.lock();
        if accepted {
            let stale = matches!(slot.entry, Some((current, _)) if end_block <= current);
            if !stale {
                info!(end_block, %hash, milestone_id, "milestone installed via sprint lock");
                slot.entry = Some((end_block, hash));
            }
            slot.milestone_ids.insert(milestone_id.to_string());
            slot.locked = true;
            slot.locked_end_block = slot.locked_end_block.max(end_block);
        } else {
            slot.milestone_ids.remove(milestone_id);
            if slot.milestone_ids.is_empty() {
                slot.locked = false;
                slot.locked_end_block = 0;
            }
        }
    }

    /// Ids of accepted milestones still in flight.
    pub fn tracked_milestone_ids(&self) -> Vec<String> {
        self.milestone.lock().milestone_ids.iter().cloned().collect()
    }

    /// Drops a rejected milestone id; the lock releases when none remain.
    pub fn remove_milestone_id(&self, milestone_id: &str) {
        let mut slot = self.milestone.lock();
        if slot.milestone_ids.remove(milestone_id) {
            warn!(milestone_id, "milestone rejected by oracle, pruned");
        }
        if slot.milestone_ids.is_empty() {
            slot.locked = false;
            slot.locked_end_block = 0;
        }
    }

    pub fn is_locked(&self) -> bool {
        self.milestone.lock().locked
    }

    // ---- vote-on-hash ----------------------------------------------------

    /// Decides a milestone vote against the local chain.
    pub fn vote_on_hash(
        &self,
        chain: &dyn ChainReader,
        start: u64,
        end: u64,
        hash: Hash,
        milestone_id: &str,
    ) -> WhitelistResult<bool> {
        debug!(start, end, milestone_id, "voting on milestone hash");
        // `end` comes from the oracle; near u64::MAX the confirmation block
        // cannot exist, so the vote can never pass.
        let confirmation = end
            .checked_add(CONFIRMATION_DEPTH)
            .ok_or(WhitelistError::TipConfirmationBlock { number: u64::MAX })?;
        if chain.header_by_number(confirmation).is_none() {
            return Err(WhitelistError::TipConfirmationBlock {
                number: confirmation,
            });
        }
        let local = chain
            .hash_by_number(end)
            .ok_or(WhitelistError::EndBlock { number: end })?;
        if !self.lock_sprint(end) {
            return Err(WhitelistError::WhitelistedAhead { number: end });
        }

        if local == hash {
            self.unlock_sprint(true, milestone_id, end, hash);
            Ok(true)
        } else {
            self.unlock_sprint(false, milestone_id, end, hash);
            Err(WhitelistError::HashMismatch { number: end })
        }
    }
}
