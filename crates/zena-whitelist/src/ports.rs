//! Outbound port: the local chain as the fetcher and voter see it.

use zena_types::{Hash, Header};

/// Read access to the canonical local chain.
pub trait ChainReader: Send + Sync {
    /// Header at `number` on the canonical chain, if present.
    fn header_by_number(&self, number: u64) -> Option<Header>;

    /// Highest canonical block number.
    fn head_number(&self) -> u64;

    fn hash_by_number(&self, number: u64) -> Option<Hash> {
        self.header_by_number(number).map(|h| h.hash())
    }
}
