//! Span reads and commits against the ValidatorSet contract.

use crate::abi;
use crate::error::{EngineError, EngineResult};
use crate::ports::outbound::EvmRunner;
use crate::system_caller::SystemCaller;
use tracing::{debug, info, warn};
use zena_types::{Address, Header, OracleSpan, Span, Validator};

pub struct Spanner<R: EvmRunner> {
    caller: SystemCaller<R>,
    validator_contract: Address,
}

impl<R: EvmRunner> Spanner<R> {
    pub fn new(caller: SystemCaller<R>, validator_contract: Address) -> Self {
        Self {
            caller,
            validator_contract,
        }
    }

    /// Span the contract considers current at `header`.
    pub fn get_current_span(&self, header: &Header) -> EngineResult<Span> {
        let outcome =
            self.caller
                .static_call(header, self.validator_contract, abi::get_current_span())?;
        self.ensure_success(&outcome)?;
        let (id, start_block, end_block) = abi::decode_span(&outcome.return_data)?;
        Ok(Span::new(id, start_block, end_block))
    }

    /// Producer set active at `at_block`, read at `header`.
    ///
    /// Preferred path walks the `producers` mapping; any failure there falls
    /// back to the legacy tuple call, which carries no validator ids.
    pub fn get_current_validators(
        &self,
        header: &Header,
        at_block: u64,
    ) -> EngineResult<Vec<Validator>> {
        let legacy = self.legacy_validators(header, at_block)?;

        match self.producer_validators(header, at_block, legacy.len()) {
            Ok(validators) => Ok(validators),
            Err(error) => {
                warn!(%error, at_block, "producers lookup failed, using legacy validator tuple");
                Ok(legacy)
            }
        }
    }

    fn producer_validators(
        &self,
        header: &Header,
        at_block: u64,
        count: usize,
    ) -> EngineResult<Vec<Validator>> {
        let outcome = self.caller.static_call(
            header,
            self.validator_contract,
            abi::get_span_by_block(at_block),
        )?;
        self.ensure_success(&outcome)?;
        let span_id = abi::decode_u64(&outcome.return_data)?;

        let mut validators = Vec::with_capacity(count);
        for index in 0..count as u64 {
            let outcome = self.caller.static_call(
                header,
                self.validator_contract,
                abi::producers(span_id, index),
            )?;
            self.ensure_success(&outcome)?;
            let (id, power, signer) = abi::decode_producer(&outcome.return_data)?;
            validators.push(Validator::new(id, signer, power as i64));
        }
        debug!(span_id, count, "resolved producers from contract");
        Ok(validators)
    }

    fn legacy_validators(&self, header: &Header, at_block: u64) -> EngineResult<Vec<Validator>> {
        let outcome = self.caller.static_call(
            header,
            self.validator_contract,
            abi::get_zena_validators(at_block),
        )?;
        self.ensure_success(&outcome)?;
        let pairs = abi::decode_address_power_arrays(&outcome.return_data)?;
        // The legacy tuple has no ids.
        Ok(pairs
            .into_iter()
            .map(|(address, power)| Validator::new(0, address, power as i64))
            .collect())
    }

    /// Commits an oracle span into the contract.
    pub fn commit_span(
        &self,
        state: &mut R::State,
        header: &Header,
        oracle_span: &OracleSpan,
    ) -> EngineResult<()> {
        let validator_bytes = rlp::encode_list::<Validator, _>(&oracle_span.validators);
        let producer_bytes = rlp::encode_list::<Validator, _>(&oracle_span.selected_producers);
        let data = abi::commit_span(
            oracle_span.span.id,
            oracle_span.span.start_block,
            oracle_span.span.end_block,
            &validator_bytes,
            &producer_bytes,
        );

        info!(
            span_id = oracle_span.span.id,
            start_block = oracle_span.span.start_block,
            end_block = oracle_span.span.end_block,
            validators = oracle_span.validators.len(),
            producers = oracle_span.selected_producers.len(),
            "committing span"
        );
        let outcome = self
            .caller
            .call(state, header, self.validator_contract, data)?;
        self.ensure_success(&outcome)?;
        Ok(())
    }

    fn ensure_success(
        &self,
        outcome: &crate::ports::outbound::CallOutcome,
    ) -> EngineResult<()> {
        match &outcome.error {
            Some(message) => Err(EngineError::SystemCall {
                contract: self.validator_contract,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}
