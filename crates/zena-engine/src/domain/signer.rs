//! ECDSA sealing key and seal recovery.
//!
//! Seals are 65 bytes: `r || s || v` with the recovery id in the last byte.
//! Both 0/1 and the legacy 27/28 recovery encodings are accepted on input;
//! signatures produced here use 0/1.

use crate::error::{EngineError, EngineResult};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use zena_types::{keccak256, Address, Hash, EXTRA_SEAL};

/// The node's sealing identity.
pub struct Signer {
    key: SigningKey,
    address: Address,
}

impl Signer {
    pub fn new(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> EngineResult<Self> {
        let key = SigningKey::from_slice(bytes)
            .map_err(|e| EngineError::Signature(e.to_string()))?;
        Ok(Self::new(key))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign_hash(&self, hash: &Hash) -> EngineResult<[u8; EXTRA_SEAL]> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|e| EngineError::Signature(e.to_string()))?;
        let mut seal = [0u8; EXTRA_SEAL];
        seal[..64].copy_from_slice(&signature.to_bytes());
        seal[64] = recovery_id.to_byte();
        Ok(seal)
    }
}

/// Recovers the sealing address from a 65-byte seal over `hash`.
pub fn recover_signer(hash: &Hash, seal: &[u8]) -> EngineResult<Address> {
    if seal.len() != EXTRA_SEAL {
        return Err(EngineError::Signature(format!(
            "seal must be {EXTRA_SEAL} bytes, got {}",
            seal.len()
        )));
    }
    let v = seal[EXTRA_SEAL - 1];
    let v = if v >= 27 { v - 27 } else { v };
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| EngineError::Signature(format!("bad recovery id {v}")))?;
    let signature = Signature::from_slice(&seal[..64])
        .map_err(|e| EngineError::Signature(e.to_string()))?;
    let key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &signature, recovery_id)
        .map_err(|e| EngineError::Signature(e.to_string()))?;
    Ok(address_of(&key))
}

fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}
