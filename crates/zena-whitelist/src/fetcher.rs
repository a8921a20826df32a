//! Background loops verifying oracle finality data against the local chain.
//!
//! One loop per kind. Each tick fetches the latest checkpoint or milestone,
//! verifies it locally and installs it through the gatekeeper. Out-of-sync
//! chains defer quietly; hash mismatches release the sprint lock and wait
//! for the local chain to reorg.

use crate::error::{WhitelistError, WhitelistResult};
use crate::gatekeeper::WhitelistGatekeeper;
use crate::ports::ChainReader;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use zena_oracle::{OracleClient, OracleError, LATEST_CHECKPOINT};
use zena_types::{keccak256_concat, Hash};

pub struct FinalityFetcher {
    oracle: Arc<dyn OracleClient>,
    gatekeeper: Arc<WhitelistGatekeeper>,
    chain: Arc<dyn ChainReader>,
    tick: Duration,
}

impl FinalityFetcher {
    pub fn new(
        oracle: Arc<dyn OracleClient>,
        gatekeeper: Arc<WhitelistGatekeeper>,
        chain: Arc<dyn ChainReader>,
        tick: Duration,
    ) -> Self {
        Self {
            oracle,
            gatekeeper,
            chain,
            tick,
        }
    }

    /// Checkpoint loop. Runs until the shutdown channel fires.
    pub async fn run_checkpoint_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.handle_checkpoint().await {
                        log_outcome("checkpoint", &error);
                    }
                }
                _ = shutdown.changed() => {
                    debug!("checkpoint loop shutting down");
                    return;
                }
            }
        }
    }

    /// Milestone loop. Also prunes rejected in-flight milestone ids.
    pub async fn run_milestone_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.handle_milestone().await {
                        log_outcome("milestone", &error);
                    }
                    self.prune_rejected_milestones().await;
                }
                _ = shutdown.changed() => {
                    debug!("milestone loop shutting down");
                    return;
                }
            }
        }
    }

    /// One checkpoint verification pass.
    pub async fn handle_checkpoint(&self) -> WhitelistResult<()> {
        let checkpoint = self.oracle.fetch_checkpoint(LATEST_CHECKPOINT).await?;
        let head = self.chain.head_number();
        if head < checkpoint.end_block {
            return Err(WhitelistError::ChainOutOfSync {
                local_head: head,
                needed: checkpoint.end_block,
            });
        }

        let root = self.header_merkle_root(checkpoint.start_block, checkpoint.end_block)?;
        if root != checkpoint.root_hash {
            return Err(WhitelistError::HashMismatch {
                number: checkpoint.end_block,
            });
        }

        let end_hash = self
            .chain
            .hash_by_number(checkpoint.end_block)
            .ok_or(WhitelistError::ChainOutOfSync {
                local_head: head,
                needed: checkpoint.end_block,
            })?;
        if self.gatekeeper.put_checkpoint(checkpoint.end_block, end_hash) {
            info!(
                start = checkpoint.start_block,
                end = checkpoint.end_block,
                "checkpoint verified against local chain"
            );
        }
        Ok(())
    }

    /// One milestone verification pass, driving the sprint lock protocol.
    pub async fn handle_milestone(&self) -> WhitelistResult<()> {
        let milestone = self.oracle.fetch_milestone().await?;
        let head = self.chain.head_number();
        if head < milestone.end_block {
            return Err(WhitelistError::ChainOutOfSync {
                local_head: head,
                needed: milestone.end_block,
            });
        }

        if !self.gatekeeper.lock_sprint(milestone.end_block) {
            debug!(end = milestone.end_block, "milestone behind whitelisted tip");
            return Ok(());
        }

        let local = self
            .chain
            .hash_by_number(milestone.end_block)
            .ok_or(WhitelistError::ChainOutOfSync {
                local_head: head,
                needed: milestone.end_block,
            })?;
        if local == milestone.hash {
            self.gatekeeper.unlock_sprint(
                true,
                &milestone.milestone_id,
                milestone.end_block,
                milestone.hash,
            );
            Ok(())
        } else {
            self.gatekeeper.unlock_sprint(
                false,
                &milestone.milestone_id,
                milestone.end_block,
                milestone.hash,
            );
            Err(WhitelistError::HashMismatch {
                number: milestone.end_block,
            })
        }
    }

    /// Drops tracked milestone ids the oracle has rejected.
    pub async fn prune_rejected_milestones(&self) {
        for id in self.gatekeeper.tracked_milestone_ids() {
            match self.oracle.fetch_no_ack_milestone(&id).await {
                Ok(()) => self.gatekeeper.remove_milestone_id(&id),
                Err(OracleError::NotInRejectedList(_)) => {}
                Err(error) => debug!(%error, milestone_id = id, "no-ack lookup failed"),
            }
        }
    }

    // Keccak Merkle root over the canonical header hashes in
    // `[start, end]`. Leaves are padded to a power of two by repeating the
    // last hash.
    fn header_merkle_root(&self, start: u64, end: u64) -> WhitelistResult<Hash> {
        let mut leaves = Vec::with_capacity((end - start + 1) as usize);
        for number in start..=end {
            let hash = self.chain.hash_by_number(number).ok_or(
                WhitelistError::ChainOutOfSync {
                    local_head: self.chain.head_number(),
                    needed: number,
                },
            )?;
            leaves.push(hash);
        }
        Ok(merkle_root(leaves))
    }
}

/// Merkle root over pre-hashed leaves.
pub fn merkle_root(mut leaves: Vec<Hash>) -> Hash {
    if leaves.is_empty() {
        return Hash::zero();
    }
    let target = leaves.len().next_power_of_two();
    while leaves.len() < target {
        leaves.push(*leaves.last().unwrap());
    }
    while leaves.len() > 1 {
        leaves = leaves
            .chunks(2)
            .map(|pair| keccak256_concat(&[pair[0].as_bytes(), pair[1].as_bytes()]))
            .collect();
    }
    leaves[0]
}

fn log_outcome(kind: &str, error: &WhitelistError) {
    if error.is_deferrable() {
        info!(kind, %error, "finality data deferred");
    } else {
        warn!(kind, %error, "finality verification failed");
    }
}
