//! System-contract dispatch with the synthetic sender.

use crate::error::EngineResult;
use crate::ports::outbound::{CallOutcome, EvmRunner, SystemCall};
use primitive_types::U256;
use std::sync::Arc;
use tracing::{debug, warn};
use zena_types::{Address, Header};

/// Sender address for consensus-originated messages. Never a real account.
pub fn system_address() -> Address {
    let mut bytes = [0xffu8; 20];
    bytes[19] = 0xfe;
    Address::from(bytes)
}

/// Gas allowance for system calls. Half the ceiling keeps intrinsic-gas
/// arithmetic in the execution layer from overflowing.
pub const SYSTEM_CALL_GAS: u64 = u64::MAX / 2;

/// Dispatches messages to system contracts. No re-entrancy guard; callers
/// serialize.
pub struct SystemCaller<R: EvmRunner> {
    runner: Arc<R>,
    validator_contract: Address,
}

impl<R: EvmRunner> SystemCaller<R> {
    pub fn new(runner: Arc<R>, validator_contract: Address) -> Self {
        Self {
            runner,
            validator_contract,
        }
    }

    fn message(&self, to: Address, data: Vec<u8>) -> SystemCall {
        SystemCall {
            from: system_address(),
            to,
            gas: SYSTEM_CALL_GAS,
            gas_price: U256::zero(),
            value: U256::zero(),
            data,
        }
    }

    /// Applies a mutating call against the supplied state.
    pub fn call(
        &self,
        state: &mut R::State,
        header: &Header,
        to: Address,
        data: Vec<u8>,
    ) -> EngineResult<CallOutcome> {
        let outcome = self
            .runner
            .apply_message(state, header, &self.message(to, data))?;
        self.audit(to, &outcome);
        Ok(outcome)
    }

    /// Read-only call against a snapshot at `header`.
    pub fn static_call(
        &self,
        header: &Header,
        to: Address,
        data: Vec<u8>,
    ) -> EngineResult<CallOutcome> {
        let outcome = self.runner.static_call(header, &self.message(to, data))?;
        self.audit(to, &outcome);
        Ok(outcome)
    }

    // The ValidatorSet contract returns nothing on success; for every other
    // contract an empty or zero return word is a failed success flag.
    fn audit(&self, to: Address, outcome: &CallOutcome) {
        if let Some(error) = &outcome.error {
            warn!(contract = %to, error, "system call failed");
            return;
        }
        if to == self.validator_contract {
            debug!(contract = %to, gas_used = outcome.gas_used, "system call applied");
            return;
        }
        let flag_ok = outcome
            .return_data
            .iter()
            .any(|b| *b != 0);
        if outcome.return_data.is_empty() || !flag_ok {
            warn!(contract = %to, "system call returned zero success flag");
        } else {
            debug!(contract = %to, gas_used = outcome.gas_used, "system call applied");
        }
    }
}
