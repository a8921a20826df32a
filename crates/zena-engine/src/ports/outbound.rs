//! Outbound ports: what the engine requires from the execution layer.

use crate::error::EngineResult;
use primitive_types::U256;
use zena_types::{Address, Header};

/// A message applied with the synthetic system sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemCall {
    pub from: Address,
    pub to: Address,
    pub gas: u64,
    pub gas_price: U256,
    pub value: U256,
    pub data: Vec<u8>,
}

/// Result of one EVM message application.
#[derive(Clone, Debug, Default)]
pub struct CallOutcome {
    pub gas_used: u64,
    pub return_data: Vec<u8>,
    /// EVM-level failure. Pending state is still finalized so touched
    /// contract storage stays observable.
    pub error: Option<String>,
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Execution backend the engine dispatches system calls through.
///
/// `State` is the backend's mutable world state handle. Mutating calls run
/// against it; read-only calls run against a snapshot at the given header.
/// Implementations run each message to completion without suspending.
pub trait EvmRunner: Send + Sync {
    type State;

    /// Applies a message against mutable state, finalizing pending changes
    /// even when the message itself fails.
    fn apply_message(
        &self,
        state: &mut Self::State,
        header: &Header,
        call: &SystemCall,
    ) -> EngineResult<CallOutcome>;

    /// Read-only dispatch against a snapshot at `header`.
    fn static_call(&self, header: &Header, call: &SystemCall) -> EngineResult<CallOutcome>;
}
