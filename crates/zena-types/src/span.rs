//! Spans: contiguous block ranges with a fixed authoritative validator set.

use crate::validator::Validator;
use serde::{Deserialize, Serialize};

/// A contiguous, non-overlapping block range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub id: u64,
    pub start_block: u64,
    pub end_block: u64,
}

impl Span {
    pub fn new(id: u64, start_block: u64, end_block: u64) -> Self {
        debug_assert!(start_block <= end_block);
        Self {
            id,
            start_block,
            end_block,
        }
    }

    /// Whether `block` falls inside this span.
    pub fn contains(&self, block: u64) -> bool {
        block >= self.start_block && block <= self.end_block
    }

    /// Whether `next` directly follows this span (id and range contiguous).
    pub fn is_followed_by(&self, next: &Span) -> bool {
        next.id == self.id + 1 && next.start_block == self.end_block + 1
    }
}

/// A span as served by the oracle: the range, the full validator set for it
/// and the selected-producers subsequence that actually seals blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSpan {
    pub span: Span,
    pub validators: Vec<Validator>,
    pub selected_producers: Vec<Validator>,
    pub chain_id: String,
}
