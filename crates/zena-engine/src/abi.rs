//! Minimal ABI encoding for the two system contracts.
//!
//! The contract surface is fixed, so calls are packed by hand instead of
//! pulling in a full ABI crate: 4-byte keccak selector, 32-byte head slots,
//! dynamic `bytes` in the tail.

use crate::error::{EngineError, EngineResult};
use primitive_types::U256;
use zena_types::{keccak256, Address};

const WORD: usize = 32;

/// First four bytes of the Keccak-256 of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn append_u256(out: &mut Vec<u8>, value: U256) {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    out.extend_from_slice(&word);
}

fn append_bytes_tail(out: &mut Vec<u8>, data: &[u8]) {
    append_u256(out, U256::from(data.len()));
    out.extend_from_slice(data);
    let pad = (WORD - data.len() % WORD) % WORD;
    out.extend_from_slice(&vec![0u8; pad]);
}

/// `getCurrentSpan()`
pub fn get_current_span() -> Vec<u8> {
    selector("getCurrentSpan()").to_vec()
}

/// `getSpanByBlock(uint256)`
pub fn get_span_by_block(number: u64) -> Vec<u8> {
    let mut out = selector("getSpanByBlock(uint256)").to_vec();
    append_u256(&mut out, U256::from(number));
    out
}

/// `producers(uint256,uint256)`
pub fn producers(span: u64, index: u64) -> Vec<u8> {
    let mut out = selector("producers(uint256,uint256)").to_vec();
    append_u256(&mut out, U256::from(span));
    append_u256(&mut out, U256::from(index));
    out
}

/// Legacy `getZenaValidators(uint256)`
pub fn get_zena_validators(number: u64) -> Vec<u8> {
    let mut out = selector("getZenaValidators(uint256)").to_vec();
    append_u256(&mut out, U256::from(number));
    out
}

/// `FIRST_END_BLOCK()`
pub fn first_end_block() -> Vec<u8> {
    selector("FIRST_END_BLOCK()").to_vec()
}

/// `commitSpan(uint256,uint256,uint256,bytes,bytes)`
pub fn commit_span(
    id: u64,
    start_block: u64,
    end_block: u64,
    validator_bytes: &[u8],
    producer_bytes: &[u8],
) -> Vec<u8> {
    let mut out = selector("commitSpan(uint256,uint256,uint256,bytes,bytes)").to_vec();
    append_u256(&mut out, U256::from(id));
    append_u256(&mut out, U256::from(start_block));
    append_u256(&mut out, U256::from(end_block));
    // Two dynamic tails after a five-slot head.
    let head = 5 * WORD;
    let validator_tail = WORD + padded_len(validator_bytes);
    append_u256(&mut out, U256::from(head));
    append_u256(&mut out, U256::from(head + validator_tail));
    append_bytes_tail(&mut out, validator_bytes);
    append_bytes_tail(&mut out, producer_bytes);
    out
}

/// `lastStateId()`
pub fn last_state_id() -> Vec<u8> {
    selector("lastStateId()").to_vec()
}

/// `commitState(uint256,bytes)`
pub fn commit_state(sync_time: u64, record_bytes: &[u8]) -> Vec<u8> {
    let mut out = selector("commitState(uint256,bytes)").to_vec();
    append_u256(&mut out, U256::from(sync_time));
    append_u256(&mut out, U256::from(2 * WORD));
    append_bytes_tail(&mut out, record_bytes);
    out
}

fn padded_len(data: &[u8]) -> usize {
    data.len() + (WORD - data.len() % WORD) % WORD
}

fn word_at(data: &[u8], index: usize) -> EngineResult<U256> {
    let start = index * WORD;
    let end = start + WORD;
    if data.len() < end {
        return Err(EngineError::AbiDecode(format!(
            "return data too short: want word {index}, got {} bytes",
            data.len()
        )));
    }
    Ok(U256::from_big_endian(&data[start..end]))
}

fn u64_at(data: &[u8], index: usize) -> EngineResult<u64> {
    let word = word_at(data, index)?;
    if word > U256::from(u64::MAX) {
        return Err(EngineError::AbiDecode(format!(
            "word {index} out of u64 range"
        )));
    }
    Ok(word.as_u64())
}

fn address_at(data: &[u8], index: usize) -> EngineResult<Address> {
    let start = index * WORD;
    let end = start + WORD;
    if data.len() < end {
        return Err(EngineError::AbiDecode(format!(
            "return data too short: want word {index}, got {} bytes",
            data.len()
        )));
    }
    Ok(Address::from_slice(&data[start + 12..end]))
}

/// Decode `(uint256 number, uint256 startBlock, uint256 endBlock)`.
pub fn decode_span(data: &[u8]) -> EngineResult<(u64, u64, u64)> {
    Ok((u64_at(data, 0)?, u64_at(data, 1)?, u64_at(data, 2)?))
}

/// Decode a single `uint256` as u64.
pub fn decode_u64(data: &[u8]) -> EngineResult<u64> {
    u64_at(data, 0)
}

/// Decode `producers` output `(uint256 id, uint256 power, address signer)`.
pub fn decode_producer(data: &[u8]) -> EngineResult<(u64, u64, Address)> {
    Ok((u64_at(data, 0)?, u64_at(data, 1)?, address_at(data, 2)?))
}

/// Decode legacy `(address[], uint256[])` output.
pub fn decode_address_power_arrays(data: &[u8]) -> EngineResult<Vec<(Address, u64)>> {
    let addr_offset = u64_at(data, 0)? as usize;
    let power_offset = u64_at(data, 1)? as usize;
    if addr_offset % WORD != 0 || power_offset % WORD != 0 {
        return Err(EngineError::AbiDecode("misaligned array offset".into()));
    }
    let addr_len = u64_at(data, addr_offset / WORD)? as usize;
    let power_len = u64_at(data, power_offset / WORD)? as usize;
    if addr_len != power_len {
        return Err(EngineError::AbiDecode(format!(
            "array length mismatch: {addr_len} addresses, {power_len} powers"
        )));
    }
    let mut out = Vec::with_capacity(addr_len);
    for i in 0..addr_len {
        let address = address_at(data, addr_offset / WORD + 1 + i)?;
        let power = u64_at(data, power_offset / WORD + 1 + i)?;
        out.push((address, power));
    }
    Ok(out)
}
