pub mod signer;

use crate::config::EngineConfig;

/// Position of a block number inside its span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockPhase {
    /// First block of a span; the next span must be committed here.
    SpanStart,
    /// Last block of a sprint; the header carries the validator bytes.
    SprintEnd,
    /// Last block of a span, not a sprint end.
    SpanEnd,
    /// Anything else.
    Interior,
}

impl BlockPhase {
    pub fn of(config: &EngineConfig, number: u64) -> Self {
        if config.is_span_start(number) {
            BlockPhase::SpanStart
        } else if config.is_sprint_end(number) {
            BlockPhase::SprintEnd
        } else if config.is_span_end(number) {
            BlockPhase::SpanEnd
        } else {
            BlockPhase::Interior
        }
    }
}
