//! Decodes on-chain Oracle accounts.
//!
//! Grounded on `switchboard-on-demand-client`'s `OracleAccountData`/`Quote`
//! pair: the verifier-relevant fields (`secp256k1_signer`, `mr_enclave`,
//! `valid_until`) live inside a nested enclave-state sub-struct.

use bytemuck::{Pod, Zeroable};
use oracle_core::ids::{MrEnclave, ObjectId, Secp256k1Key};
use solana_sdk::pubkey::Pubkey;

use crate::ids::object_id_for;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EnclaveState {
    pub mr_enclave: [u8; 32],
    pub secp256k1_signer: [u8; 64],
    pub valid_until: i64,
}

unsafe impl Pod for EnclaveState {}
unsafe impl Zeroable for EnclaveState {}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OracleAccountData {
    pub enclave: EnclaveState,
    pub authority: Pubkey,
    pub queue: Pubkey,
    pub created_at: i64,
    _ebuf2: [u8; 64],
    _ebuf1: [u8; 256],
}

unsafe impl Pod for OracleAccountData {}
unsafe impl Zeroable for OracleAccountData {}

impl OracleAccountData {
    pub fn size() -> usize {
        8 + std::mem::size_of::<OracleAccountData>()
    }
}

/// Decoded, host-agnostic view of an Oracle account, ready to feed into
/// `oracle_core::oracle::Oracle`.
#[derive(Debug, Clone)]
pub struct OracleSnapshot {
    pub id: ObjectId,
    pub pubkey: Pubkey,
    pub queue_id: ObjectId,
    pub secp256k1_key: Secp256k1Key,
    pub mr_enclave: MrEnclave,
    pub expiration_time_ms: u64,
}

impl OracleSnapshot {
    pub fn from_account(pubkey: Pubkey, parsed: &OracleAccountData) -> Self {
        Self {
            id: object_id_for(&pubkey),
            pubkey,
            queue_id: object_id_for(&parsed.queue),
            secp256k1_key: Secp256k1Key(parsed.enclave.secp256k1_signer),
            mr_enclave: MrEnclave(parsed.enclave.mr_enclave),
            expiration_time_ms: (parsed.enclave.valid_until.max(0) as u64).saturating_mul(1000),
        }
    }
}
