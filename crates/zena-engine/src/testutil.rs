//! Shared test doubles for the engine crate.

use crate::error::EngineResult;
use crate::ports::outbound::{CallOutcome, EvmRunner, SystemCall};
use parking_lot::Mutex;
use zena_types::Header;

/// Records every message it sees and plays back scripted outcomes in order.
/// Once the script is exhausted it answers with empty successes.
pub(crate) struct ScriptedRunner {
    pub calls: Mutex<Vec<SystemCall>>,
    pub outcomes: Mutex<Vec<CallOutcome>>,
}

impl ScriptedRunner {
    pub fn new(outcomes: Vec<CallOutcome>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes),
        }
    }

    pub fn success(return_data: Vec<u8>) -> CallOutcome {
        CallOutcome {
            gas_used: 21_000,
            return_data,
            error: None,
        }
    }

    pub fn failure(message: &str) -> CallOutcome {
        CallOutcome {
            gas_used: 0,
            return_data: Vec::new(),
            error: Some(message.to_string()),
        }
    }

    fn next(&self, call: &SystemCall) -> CallOutcome {
        self.calls.lock().push(call.clone());
        let mut outcomes = self.outcomes.lock();
        if outcomes.is_empty() {
            CallOutcome::default()
        } else {
            outcomes.remove(0)
        }
    }
}

impl EvmRunner for ScriptedRunner {
    type State = ();

    fn apply_message(
        &self,
        _state: &mut (),
        _header: &Header,
        call: &SystemCall,
    ) -> EngineResult<CallOutcome> {
        Ok(self.next(call))
    }

    fn static_call(&self, _header: &Header, call: &SystemCall) -> EngineResult<CallOutcome> {
        Ok(self.next(call))
    }
}
