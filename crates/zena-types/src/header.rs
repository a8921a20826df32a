//! EVM-style block header with the PoA extra-data layout.
//!
//! `extra_data = vanity(32) || validators(|V| * 40, sprint-end only) || seal(65)`.
//!
//! The seal is a 65-byte secp256k1 signature over
//! `keccak256(rlp(header_without_seal, chain_id))`.

use crate::validator::{Validator, VALIDATOR_ENTRY_BYTES};
use crate::{keccak256, Address, Hash};
use rlp::RlpStream;
use serde::{Deserialize, Serialize};

/// Fixed vanity prefix length in `extra_data`.
pub const EXTRA_VANITY: usize = 32;

/// Fixed seal suffix length in `extra_data` (r || s || v).
pub const EXTRA_SEAL: usize = 65;

/// Block header.
///
/// Only the fields the consensus engine reads and writes are carried here;
/// the trie roots are opaque to this crate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub parent_hash: Hash,
    pub coinbase: Address,
    pub state_root: Hash,
    pub transactions_root: Hash,
    pub receipts_root: Hash,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub time: u64,
    pub difficulty: u64,
    pub extra_data: Vec<u8>,
}

impl Header {
    /// Full header hash: `keccak256(rlp(header))`.
    pub fn hash(&self) -> Hash {
        let mut stream = RlpStream::new();
        self.rlp_append(&mut stream, true, None);
        keccak256(&stream.out())
    }

    /// Hash signed by the sealer: the seal suffix is stripped and the chain
    /// id is mixed in so signatures cannot be replayed across chains.
    pub fn seal_hash(&self, chain_id: u64) -> Hash {
        let mut stream = RlpStream::new();
        self.rlp_append(&mut stream, false, Some(chain_id));
        keccak256(&stream.out())
    }

    /// The 65-byte seal suffix, if the extra-data is long enough to hold it.
    pub fn seal(&self) -> Option<&[u8]> {
        if self.extra_data.len() < EXTRA_VANITY + EXTRA_SEAL {
            return None;
        }
        Some(&self.extra_data[self.extra_data.len() - EXTRA_SEAL..])
    }

    /// The bytes between vanity and seal, carrying ordered validator
    /// entries on sprint-end blocks.
    pub fn extra_validator_bytes(&self) -> Option<&[u8]> {
        let len = self.extra_data.len();
        if len < EXTRA_VANITY + EXTRA_SEAL {
            return None;
        }
        Some(&self.extra_data[EXTRA_VANITY..len - EXTRA_SEAL])
    }

    fn rlp_append(&self, s: &mut RlpStream, with_seal: bool, chain_id: Option<u64>) {
        let extra: &[u8] = if with_seal {
            &self.extra_data
        } else if self.extra_data.len() >= EXTRA_SEAL {
            &self.extra_data[..self.extra_data.len() - EXTRA_SEAL]
        } else {
            &self.extra_data
        };

        s.begin_list(11 + usize::from(chain_id.is_some()));
        s.append(&self.parent_hash);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.time);
        s.append(&self.difficulty);
        s.append(&extra);
        if let Some(id) = chain_id {
            s.append(&id);
        }
    }
}

/// Build extra-data for a block being prepared: vanity, the ordered
/// validator entries (sprint-end only, pass an empty slice otherwise) and a
/// zeroed seal placeholder for the signer to fill.
pub fn encode_extra(vanity: &[u8; EXTRA_VANITY], validators: &[Validator]) -> Vec<u8> {
    let mut extra =
        Vec::with_capacity(EXTRA_VANITY + validators.len() * VALIDATOR_ENTRY_BYTES + EXTRA_SEAL);
    extra.extend_from_slice(vanity);
    for v in validators {
        extra.extend_from_slice(&v.header_bytes());
    }
    extra.extend_from_slice(&[0u8; EXTRA_SEAL]);
    extra
}

/// Decode the validator entries out of sprint-end extra-data. Returns the
/// vanity and the parsed validators, or `None` when the middle segment is
/// not a whole number of 40-byte entries.
pub fn decode_extra(extra: &[u8]) -> Option<([u8; EXTRA_VANITY], Vec<Validator>)> {
    if extra.len() < EXTRA_VANITY + EXTRA_SEAL {
        return None;
    }
    let mut vanity = [0u8; EXTRA_VANITY];
    vanity.copy_from_slice(&extra[..EXTRA_VANITY]);

    let body = &extra[EXTRA_VANITY..extra.len() - EXTRA_SEAL];
    if body.len() % VALIDATOR_ENTRY_BYTES != 0 {
        return None;
    }
    let validators = body
        .chunks(VALIDATOR_ENTRY_BYTES)
        .map(Validator::from_header_bytes)
        .collect::<Option<Vec<_>>>()?;
    Some((vanity, validators))
}
