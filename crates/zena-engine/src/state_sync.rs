//! Ordered application of state-sync events into the StateReceiver contract.

use crate::abi;
use crate::error::{EngineError, EngineResult};
use crate::ports::outbound::EvmRunner;
use crate::system_caller::SystemCaller;
use tracing::{debug, info};
use zena_types::{Address, EventRecord, Header};

pub struct StateSyncCommitter<R: EvmRunner> {
    caller: SystemCaller<R>,
    state_receiver_contract: Address,
}

impl<R: EvmRunner> StateSyncCommitter<R> {
    pub fn new(caller: SystemCaller<R>, state_receiver_contract: Address) -> Self {
        Self {
            caller,
            state_receiver_contract,
        }
    }

    /// Last event id the contract has applied.
    pub fn last_state_id(&self, header: &Header) -> EngineResult<u64> {
        let outcome = self.caller.static_call(
            header,
            self.state_receiver_contract,
            abi::last_state_id(),
        )?;
        abi::decode_u64(&outcome.return_data)
    }

    /// Applies an ordered batch. Ids must ascend from `last_id + 1` without
    /// holes; a gap aborts the whole batch. Returns per-event gas.
    pub fn commit_events(
        &self,
        state: &mut R::State,
        header: &Header,
        last_id: u64,
        events: &[EventRecord],
    ) -> EngineResult<Vec<u64>> {
        let mut expected = last_id + 1;
        let mut gas_used = Vec::with_capacity(events.len());

        for event in events {
            if event.id != expected {
                return Err(EngineError::EventSequenceGap {
                    expected,
                    got: event.id,
                });
            }
            let data = abi::commit_state(event.time, &event.rlp_bytes());
            let outcome =
                self.caller
                    .call(state, header, self.state_receiver_contract, data)?;
            debug!(event_id = event.id, gas_used = outcome.gas_used, "state-sync event applied");
            gas_used.push(outcome.gas_used);
            expected += 1;
        }

        if !events.is_empty() {
            info!(
                count = events.len(),
                last_id = expected - 1,
                "state-sync batch committed"
            );
        }
        Ok(gas_used)
    }
}
