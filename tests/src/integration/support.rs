//! Shared fixtures: a system-contract simulator and an in-memory chain.

use parking_lot::Mutex;
use primitive_types::U256;
use zena_engine::abi::selector;
use zena_engine::{CallOutcome, EngineResult, EvmRunner, SystemCall};
use zena_types::{Address, Hash, Header, Span, Validator};
use zena_whitelist::ChainReader;

/// In-memory stand-in for the two system contracts. Answers the read
/// calls from its current state and applies `commitSpan`/`commitState`
/// like the on-chain contracts would.
pub struct ChainSim {
    pub validator_contract: Address,
    pub state_receiver_contract: Address,
    span_size: u64,
    validators: Mutex<Vec<Validator>>,
    current_span: Mutex<Span>,
    committed_spans: Mutex<Vec<Span>>,
    last_state_id: Mutex<u64>,
    committed_records: Mutex<Vec<Vec<u8>>>,
}

impl ChainSim {
    pub fn new(span_size: u64, validators: Vec<Validator>) -> Self {
        Self {
            validator_contract: Address::repeat_byte(0x10),
            state_receiver_contract: Address::repeat_byte(0x11),
            span_size,
            validators: Mutex::new(validators),
            current_span: Mutex::new(Span::new(0, 0, span_size - 1)),
            committed_spans: Mutex::new(Vec::new()),
            last_state_id: Mutex::new(0),
            committed_records: Mutex::new(Vec::new()),
        }
    }

    pub fn validators(&self) -> Vec<Validator> {
        self.validators.lock().clone()
    }

    pub fn committed_spans(&self) -> Vec<Span> {
        self.committed_spans.lock().clone()
    }

    pub fn last_state_id(&self) -> u64 {
        *self.last_state_id.lock()
    }

    pub fn committed_records(&self) -> Vec<Vec<u8>> {
        self.committed_records.lock().clone()
    }

    fn word(data: &[u8], index: usize) -> U256 {
        U256::from_big_endian(&data[index * 32..(index + 1) * 32])
    }

    fn encode_words(words: &[U256]) -> Vec<u8> {
        let mut out = Vec::with_capacity(words.len() * 32);
        for word in words {
            let mut buf = [0u8; 32];
            word.to_big_endian(&mut buf);
            out.extend_from_slice(&buf);
        }
        out
    }

    fn address_word(address: &Address) -> U256 {
        U256::from_big_endian(address.as_bytes())
    }

    fn dispatch(&self, call: &SystemCall) -> CallOutcome {
        let sel: [u8; 4] = call.data[..4].try_into().unwrap();
        let body = &call.data[4..];

        let return_data = if sel == selector("getCurrentSpan()") {
            let span = self.current_span.lock();
            Self::encode_words(&[
                U256::from(span.id),
                U256::from(span.start_block),
                U256::from(span.end_block),
            ])
        } else if sel == selector("getSpanByBlock(uint256)") {
            let number = Self::word(body, 0).as_u64();
            Self::encode_words(&[U256::from(number / self.span_size)])
        } else if sel == selector("producers(uint256,uint256)") {
            let index = Self::word(body, 1).as_u64() as usize;
            let validators = self.validators.lock();
            match validators.get(index) {
                Some(v) => Self::encode_words(&[
                    U256::from(v.id),
                    U256::from(v.voting_power as u64),
                    Self::address_word(&v.address),
                ]),
                None => {
                    return CallOutcome {
                        gas_used: 0,
                        return_data: Vec::new(),
                        error: Some("producer index out of range".to_string()),
                    }
                }
            }
        } else if sel == selector("getZenaValidators(uint256)") {
            let validators = self.validators.lock();
            let n = validators.len();
            let mut words = vec![U256::from(64), U256::from(64 + 32 + 32 * n)];
            words.push(U256::from(n));
            words.extend(validators.iter().map(|v| Self::address_word(&v.address)));
            words.push(U256::from(n));
            words.extend(validators.iter().map(|v| U256::from(v.voting_power as u64)));
            Self::encode_words(&words)
        } else if sel == selector("FIRST_END_BLOCK()") {
            Self::encode_words(&[U256::from(self.span_size - 1)])
        } else if sel == selector("commitSpan(uint256,uint256,uint256,bytes,bytes)") {
            return self.apply_commit_span(body);
        } else if sel == selector("lastStateId()") {
            Self::encode_words(&[U256::from(*self.last_state_id.lock())])
        } else if sel == selector("commitState(uint256,bytes)") {
            return self.apply_commit_state(body);
        } else {
            return CallOutcome {
                gas_used: 0,
                return_data: Vec::new(),
                error: Some("unknown selector".to_string()),
            };
        };

        CallOutcome {
            gas_used: 21_000,
            return_data,
            error: None,
        }
    }

    fn apply_commit_span(&self, body: &[u8]) -> CallOutcome {
        let id = Self::word(body, 0).as_u64();
        let start_block = Self::word(body, 1).as_u64();
        let end_block = Self::word(body, 2).as_u64();
        let offset = Self::word(body, 3).as_u64() as usize;
        let len = Self::word(body, offset / 32).as_u64() as usize;
        let validator_bytes = &body[offset + 32..offset + 32 + len];

        let decoded: Vec<Validator> = rlp::decode_list(validator_bytes);
        if decoded.is_empty() {
            return CallOutcome {
                gas_used: 0,
                return_data: Vec::new(),
                error: Some("empty validator bytes".to_string()),
            };
        }

        let span = Span::new(id, start_block, end_block);
        *self.current_span.lock() = span;
        *self.validators.lock() = decoded;
        self.committed_spans.lock().push(span);

        // commitSpan returns nothing on success.
        CallOutcome {
            gas_used: 50_000,
            return_data: Vec::new(),
            error: None,
        }
    }

    fn apply_commit_state(&self, body: &[u8]) -> CallOutcome {
        let offset = Self::word(body, 1).as_u64() as usize;
        let len = Self::word(body, offset / 32).as_u64() as usize;
        let record = body[offset + 32..offset + 32 + len].to_vec();

        *self.last_state_id.lock() += 1;
        self.committed_records.lock().push(record);

        CallOutcome {
            gas_used: 30_000,
            return_data: Self::encode_words(&[U256::from(1)]),
            error: None,
        }
    }
}

impl EvmRunner for ChainSim {
    type State = ();

    fn apply_message(
        &self,
        _state: &mut (),
        _header: &Header,
        call: &SystemCall,
    ) -> EngineResult<CallOutcome> {
        Ok(self.dispatch(call))
    }

    fn static_call(&self, _header: &Header, call: &SystemCall) -> EngineResult<CallOutcome> {
        Ok(self.dispatch(call))
    }
}

/// Canonical in-memory chain with linked parent hashes.
pub struct MemChain {
    headers: Vec<Header>,
}

impl MemChain {
    /// Builds blocks `0..=head` with consistent parent links.
    pub fn up_to(head: u64) -> Self {
        let mut headers: Vec<Header> = Vec::with_capacity(head as usize + 1);
        let mut parent_hash = Hash::zero();
        for number in 0..=head {
            let header = Header {
                parent_hash,
                number,
                time: 1_700_000_000 + number * 2,
                gas_limit: 30_000_000,
                ..Default::default()
            };
            parent_hash = header.hash();
            headers.push(header);
        }
        Self { headers }
    }
}

impl ChainReader for MemChain {
    fn header_by_number(&self, number: u64) -> Option<Header> {
        self.headers.get(number as usize).cloned()
    }

    fn head_number(&self) -> u64 {
        self.headers.len() as u64 - 1
    }
}

pub fn validator(id: u64, address_byte: u8, power: i64) -> Validator {
    Validator::new(id, Address::repeat_byte(address_byte), power)
}
