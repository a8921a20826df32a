//! Engine configuration.
//!
//! Block-time, sprint length and producer-delay parameters are per-fork
//! maps keyed by activation block; lookup takes the entry with the highest
//! key not above the queried block.

use serde::Deserialize;
use std::collections::BTreeMap;
use zena_types::Address;

/// Span length used by tests and local networks.
pub const DEFAULT_SPAN_SIZE: u64 = 8;

/// Runtime configuration for the consensus engine.
#[derive(Clone, Debug, Deserialize)]
pub struct EngineConfig {
    /// Chain id mixed into the seal hash.
    pub chain_id: u64,

    /// Block period in seconds, per fork.
    pub period: BTreeMap<u64, u64>,

    /// Sprint length in blocks, per fork.
    pub sprint: BTreeMap<u64, u64>,

    /// Span length in blocks.
    pub span_size: u64,

    /// Extra delay applied to out-of-turn signers, per fork.
    pub backup_multiplier: BTreeMap<u64, u64>,

    /// Time subtracted from the header timestamp when bounding the
    /// state-sync event window, per fork.
    pub producer_delay: BTreeMap<u64, u64>,

    /// ValidatorSet system contract.
    pub validator_contract: Address,

    /// StateReceiver system contract.
    pub state_receiver_contract: Address,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chain_id: 80002,
            period: BTreeMap::from([(0, 2)]),
            sprint: BTreeMap::from([(0, 4)]),
            span_size: DEFAULT_SPAN_SIZE,
            backup_multiplier: BTreeMap::from([(0, 2)]),
            producer_delay: BTreeMap::from([(0, 4)]),
            validator_contract: Address::repeat_byte(0x10),
            state_receiver_contract: Address::repeat_byte(0x11),
        }
    }
}

fn fork_value(map: &BTreeMap<u64, u64>, number: u64, fallback: u64) -> u64 {
    map.range(..=number)
        .next_back()
        .map(|(_, v)| *v)
        .unwrap_or(fallback)
}

impl EngineConfig {
    pub fn period_at(&self, number: u64) -> u64 {
        fork_value(&self.period, number, 2)
    }

    pub fn sprint_at(&self, number: u64) -> u64 {
        fork_value(&self.sprint, number, 4).max(1)
    }

    pub fn backup_multiplier_at(&self, number: u64) -> u64 {
        fork_value(&self.backup_multiplier, number, 2)
    }

    pub fn producer_delay_at(&self, number: u64) -> u64 {
        fork_value(&self.producer_delay, number, 4)
    }

    pub fn is_span_start(&self, number: u64) -> bool {
        number % self.span_size.max(1) == 0
    }

    pub fn is_span_end(&self, number: u64) -> bool {
        (number + 1) % self.span_size.max(1) == 0
    }

    pub fn is_sprint_start(&self, number: u64) -> bool {
        number % self.sprint_at(number) == 0
    }

    pub fn is_sprint_end(&self, number: u64) -> bool {
        (number + 1) % self.sprint_at(number) == 0
    }
}
