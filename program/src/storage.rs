//! On-chain account layouts and the reconstruction of `oracle-core`
//! domain objects from them.
//!
//! `Queue` and `Oracle` are kept deliberately non-`Pod` in `oracle-core`
//! (a `BTreeMap`/`BTreeSet` inside `Queue`, `Vec<MrEnclave>` inside
//! `Oracle`) because those collections are verification-time conveniences,
//! not the wire format. This module is where the two meet: plain
//! fixed-layout structs for account storage, and cheap per-instruction
//! reconstruction of the richer in-memory types from them.

use bytemuck::{Pod, Zeroable};
use oracle_core::host::NullEventSink;
use oracle_core::ids::{MrEnclave, ObjectId, OracleKey, QueueKey, Secp256k1Key};
use oracle_core::oracle::Oracle;
use oracle_core::queue::{Queue, QueueConfig};
use oracle_core::quote_verifier::QuoteVerifier;

pub const MAX_FEE_TYPES: usize = 4;
pub const FEE_TYPE_LEN: usize = 8;
/// Upper bound on a queue's registered-oracle table. Sized to match
/// `oracle_core::submit::MAX_COMMITTEE_SIZE`-scale deployments with room for
/// rotation; raising it means a larger `StoredQueue` account.
pub const MAX_QUEUE_ORACLES: usize = 32;

fn object_id_for(key: &[u8; 32]) -> ObjectId {
    ObjectId(u64::from_le_bytes(key[..8].try_into().unwrap()))
}

/// Fixed-layout Queue account. `fee_types` is a small inline table rather
/// than a `Vec` — on-chain accounts cannot grow an embedded collection
/// without a realloc, so the fee-coin set is capped at `MAX_FEE_TYPES`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StoredQueue {
    pub authority: [u8; 32],
    pub queue_key: [u8; 32],
    pub fee_recipient: [u8; 32],
    pub guardian_queue: [u8; 32],
    pub has_guardian_queue: u8,
    pub is_guardian: u8,
    _padding: [u8; 6],
    pub min_attestations: u32,
    pub oracle_validity_length_ms: u64,
    pub fee: u64,
    pub last_queue_override_ms: u64,
    pub fee_types: [[u8; FEE_TYPE_LEN]; MAX_FEE_TYPES],
    pub fee_types_len: u8,
    _padding2: [u8; 7],
    /// `existing_oracles`: the sole admission criterion for an oracle's
    /// signature (spec.md §3). Parallel to `oracle_keys` by index;
    /// `oracle_count` of the leading entries are live.
    pub oracle_ids: [u64; MAX_QUEUE_ORACLES],
    pub oracle_keys: [[u8; 32]; MAX_QUEUE_ORACLES],
    pub oracle_count: u32,
    _padding3: [u8; 4],
}

unsafe impl Pod for StoredQueue {}
unsafe impl Zeroable for StoredQueue {}

/// Fixed-layout Oracle account.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StoredOracle {
    pub queue: [u8; 32],
    pub oracle_key: [u8; 32],
    pub secp256k1_key: [u8; 64],
    pub mr_enclave: [u8; 32],
    pub expiration_time_ms: u64,
}

unsafe impl Pod for StoredOracle {}
unsafe impl Zeroable for StoredOracle {}

fn fee_type_str(raw: &[u8; FEE_TYPE_LEN]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(FEE_TYPE_LEN);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Rebuilds a logical `Queue` for the duration of one instruction. Uses a
/// `NullEventSink` throughout: this is a deserialize step, not a state
/// transition, so none of `Queue::init`'s or `add_fee_coin`'s events are
/// real — the instruction handler emits its own events for whatever it
/// actually changes.
pub fn reconstruct_queue(account_key: &[u8; 32], stored: &StoredQueue) -> Queue {
    let mut sink = NullEventSink;
    let mut queue = Queue::init(
        object_id_for(account_key),
        QueueKey(stored.queue_key),
        object_id_for(&stored.authority),
        String::new(),
        QueueConfig {
            min_attestations: stored.min_attestations,
            oracle_validity_length_ms: stored.oracle_validity_length_ms,
            fee: stored.fee,
            fee_recipient: object_id_for(&stored.fee_recipient),
            guardian_queue_id: (stored.has_guardian_queue != 0)
                .then(|| object_id_for(&stored.guardian_queue)),
        },
        stored.is_guardian != 0,
        &mut sink,
    )
    .expect("persisted queue config was valid when it was written");

    for raw in &stored.fee_types[..stored.fee_types_len as usize] {
        queue
            .add_fee_coin(queue.authority, fee_type_str(raw), &mut sink)
            .expect("persisted fee type is always accepted by its own authority");
    }
    queue.last_queue_override_ms = stored.last_queue_override_ms;

    let oracle_count = (stored.oracle_count as usize).min(MAX_QUEUE_ORACLES);
    for i in 0..oracle_count {
        queue.restore_oracle_membership(ObjectId(stored.oracle_ids[i]), OracleKey(stored.oracle_keys[i]));
    }
    queue
}

/// Fixed-layout QuoteVerifier account. Carries only the queue binding —
/// the actual per-feed quote table lives in the account's remaining space
/// and is read/written by `verify_quotes`/`get_quote` handlers, not by
/// teardown, so `delete_verifier` never needs to decode it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StoredQuoteVerifier {
    pub queue: [u8; 32],
}

unsafe impl Pod for StoredQuoteVerifier {}
unsafe impl Zeroable for StoredQuoteVerifier {}

/// Rebuilds a logical `QuoteVerifier` from its stored queue binding.
pub fn reconstruct_quote_verifier(account_key: &[u8; 32], stored: &StoredQuoteVerifier) -> QuoteVerifier {
    QuoteVerifier::new(object_id_for(account_key), object_id_for(&stored.queue))
}

/// Rebuilds a logical `Oracle` from its stored fields. `valid_attestations`
/// is not persisted — it only matters during a guardian-attested override,
/// which runs as its own instruction against fresh data.
pub fn reconstruct_oracle(account_key: &[u8; 32], stored: &StoredOracle) -> Oracle {
    let mut oracle = Oracle::init(
        object_id_for(account_key),
        object_id_for(&stored.queue),
        OracleKey(stored.oracle_key),
    );
    oracle.secp256k1_key = Secp256k1Key(stored.secp256k1_key);
    oracle.mr_enclave = MrEnclave(stored.mr_enclave);
    oracle.expiration_time_ms = stored.expiration_time_ms;
    oracle
}
