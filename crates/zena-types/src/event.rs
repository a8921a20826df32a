//! Root-chain state-sync event records.

use crate::{Address, Hash};
use rlp::RlpStream;
use serde::{Deserialize, Serialize};

/// One event emitted on the root chain, to be replayed into the
/// StateReceiver system contract. Ids are monotone and unique; each record
/// is consumed exactly once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    pub contract: Address,
    pub data: Vec<u8>,
    pub tx_hash: Hash,
    pub log_index: u64,
    pub chain_id: String,
    /// Root-chain timestamp, unix seconds.
    pub time: u64,
}

impl EventRecord {
    /// RLP body handed to `commitState`: `[id, contract, data, tx_hash,
    /// log_index, chain_id]`. The on-chain StateReceiver decodes this
    /// layout.
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(6);
        s.append(&self.id);
        s.append(&self.contract);
        s.append(&self.data);
        s.append(&self.tx_hash);
        s.append(&self.log_index);
        s.append(&self.chain_id.as_bytes());
        s.out().to_vec()
    }
}
