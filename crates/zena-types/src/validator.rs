//! Validator entities and the weighted validator set.
//!
//! The set implements Tendermint-style proposer selection: each rotation
//! step adds every validator's voting power to its priority, selects the
//! validator with the highest priority as proposer, then subtracts the total
//! voting power from the winner. Producer rotation across a span is fully
//! deterministic given the seed set.

use crate::Address;
use rlp::{DecoderError, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

/// Size of one validator entry inside header extra-data:
/// `address(20) || power(20, big-endian)`.
pub const VALIDATOR_ENTRY_BYTES: usize = 40;

/// A single authority in the set.
///
/// Identity (`id`, `address`) is immutable. `proposer_priority` mutates only
/// through the rotation algorithm; `voting_power` only on span change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: u64,
    pub address: Address,
    pub voting_power: i64,
    #[serde(default)]
    pub proposer_priority: i64,
}

impl Validator {
    /// Create a validator with zero priority.
    pub fn new(id: u64, address: Address, voting_power: i64) -> Self {
        Self {
            id,
            address,
            voting_power,
            proposer_priority: 0,
        }
    }

    /// Encode as the 40-byte header entry: `address || power` with the power
    /// left-padded to 20 bytes big-endian.
    pub fn header_bytes(&self) -> [u8; VALIDATOR_ENTRY_BYTES] {
        let mut out = [0u8; VALIDATOR_ENTRY_BYTES];
        out[..20].copy_from_slice(self.address.as_bytes());
        out[32..40].copy_from_slice(&(self.voting_power as u64).to_be_bytes());
        out
    }

    /// Decode a 40-byte header entry. The numeric id is not carried in
    /// headers and is left at zero.
    pub fn from_header_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != VALIDATOR_ENTRY_BYTES {
            return None;
        }
        let address = Address::from_slice(&bytes[..20]);
        // Powers above u64 range are not representable on this chain.
        if bytes[20..32].iter().any(|&b| b != 0) {
            return None;
        }
        let mut power = [0u8; 8];
        power.copy_from_slice(&bytes[32..40]);
        Some(Self::new(0, address, u64::from_be_bytes(power) as i64))
    }
}

// RLP form used by `commitSpan`: [id, power, address]. The on-chain
// ValidatorSet contract decodes exactly this layout.
impl rlp::Encodable for Validator {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.id);
        s.append(&(self.voting_power as u64));
        s.append(&self.address);
    }
}

impl rlp::Decodable for Validator {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            id: rlp.val_at(0)?,
            voting_power: rlp.val_at::<u64>(1)? as i64,
            address: rlp.val_at(2)?,
            proposer_priority: 0,
        })
    }
}

/// Ordered validator set with a current-proposer pointer.
///
/// Invariant: after any `update` the priorities sum to zero (within integer
/// rounding), and the proposer is the validator with the highest priority,
/// ties broken by ascending address bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
    proposer: Option<Validator>,
}

impl ValidatorSet {
    /// Create a set. Validators are kept sorted by address.
    pub fn new(mut validators: Vec<Validator>) -> Self {
        validators.sort_by(|a, b| a.address.cmp(&b.address));
        let proposer = max_priority(&validators).cloned();
        Self {
            validators,
            proposer,
        }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Check membership by address.
    pub fn contains(&self, address: &Address) -> bool {
        self.validators.iter().any(|v| &v.address == address)
    }

    pub fn get_by_address(&self, address: &Address) -> Option<&Validator> {
        self.validators.iter().find(|v| &v.address == address)
    }

    /// The current proposer.
    pub fn proposer(&self) -> Option<&Validator> {
        self.proposer.as_ref()
    }

    /// Saturated sum of voting powers.
    pub fn total_voting_power(&self) -> i64 {
        self.validators
            .iter()
            .fold(0i64, |acc, v| acc.saturating_add(v.voting_power))
    }

    /// Advance the rotation `times` steps and return the resulting proposer.
    ///
    /// Each step adds every validator's power to its priority, elects the
    /// highest-priority validator (lowest address on ties) and subtracts the
    /// total voting power from the winner. Before stepping, priorities are
    /// rescaled so their spread stays within `2 * total_voting_power`.
    pub fn increment_proposer_priority(&mut self, times: u32) -> Option<Validator> {
        if self.validators.is_empty() {
            return None;
        }
        self.rescale_priorities();

        let total = self.total_voting_power();
        for _ in 0..times {
            for v in &mut self.validators {
                v.proposer_priority = v.proposer_priority.saturating_add(v.voting_power);
            }
            let idx = max_priority_index(&self.validators)?;
            self.validators[idx].proposer_priority =
                self.validators[idx].proposer_priority.saturating_sub(total);
            self.proposer = Some(self.validators[idx].clone());
        }
        self.proposer.clone()
    }

    /// Produce a new set from `new_validators`, preserving the priority of
    /// every validator that survives (matched by address) and resetting the
    /// rest to zero, then re-centering so priorities sum to zero.
    pub fn update(&self, new_validators: Vec<Validator>) -> ValidatorSet {
        let mut merged: Vec<Validator> = new_validators
            .into_iter()
            .map(|mut v| {
                v.proposer_priority = self
                    .get_by_address(&v.address)
                    .map(|old| old.proposer_priority)
                    .unwrap_or(0);
                v
            })
            .collect();
        merged.sort_by(|a, b| a.address.cmp(&b.address));

        let mut set = ValidatorSet {
            validators: merged,
            proposer: None,
        };
        set.center_priorities();
        set.proposer = max_priority(&set.validators).cloned();
        set
    }

    /// Number of rotation steps until `signer` becomes proposer, or `None`
    /// if the signer is not in the set.
    pub fn rotation_distance(&self, signer: &Address) -> Option<u64> {
        if !self.contains(signer) {
            return None;
        }
        let mut probe = self.clone();
        if probe.proposer.is_none() {
            probe.proposer = max_priority(&probe.validators).cloned();
        }
        for step in 0..probe.validators.len() as u64 {
            if probe.proposer().map(|p| &p.address) == Some(signer) {
                return Some(step);
            }
            probe.increment_proposer_priority(1);
        }
        None
    }

    /// Expected difficulty for a block sealed by `signer`:
    /// `len - rotation_distance`. The in-turn proposer gets `len`.
    pub fn difficulty(&self, signer: &Address) -> Option<u64> {
        self.rotation_distance(signer)
            .map(|d| self.validators.len() as u64 - d)
    }

    /// Shift all priorities by the average so the sum returns to zero.
    fn center_priorities(&mut self) {
        if self.validators.is_empty() {
            return;
        }
        let sum: i64 = self
            .validators
            .iter()
            .fold(0i64, |acc, v| acc.saturating_add(v.proposer_priority));
        let avg = sum / self.validators.len() as i64;
        for v in &mut self.validators {
            v.proposer_priority = v.proposer_priority.saturating_sub(avg);
        }
    }

    /// Halve all priorities while their spread exceeds twice the total
    /// voting power. Prevents unbounded growth under long runs.
    fn rescale_priorities(&mut self) {
        let cap = self.total_voting_power().saturating_mul(2);
        if cap == 0 {
            return;
        }
        while self.priority_spread() > cap {
            for v in &mut self.validators {
                v.proposer_priority /= 2;
            }
        }
    }

    fn priority_spread(&self) -> i64 {
        let max = self
            .validators
            .iter()
            .map(|v| v.proposer_priority)
            .max()
            .unwrap_or(0);
        let min = self
            .validators
            .iter()
            .map(|v| v.proposer_priority)
            .min()
            .unwrap_or(0);
        max.saturating_sub(min)
    }
}

/// Highest-priority validator; ties broken by ascending address bytes.
fn max_priority(validators: &[Validator]) -> Option<&Validator> {
    max_priority_index(validators).map(|i| &validators[i])
}

fn max_priority_index(validators: &[Validator]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, v) in validators.iter().enumerate() {
        best = match best {
            None => Some(i),
            Some(j) => {
                let cur = &validators[j];
                if v.proposer_priority > cur.proposer_priority
                    || (v.proposer_priority == cur.proposer_priority
                        && v.address < cur.address)
                {
                    Some(i)
                } else {
                    Some(j)
                }
            }
        };
    }
    best
}
