//! Maps Solana `Pubkey`s onto the core's opaque `ObjectId`.
//!
//! `oracle-core` treats object identity as host-allocated and never looks
//! inside it (see `oracle_core::host::ObjectStore`). On Solana there is no
//! small integer to hand back — an account is identified by its 32-byte
//! address — so the client derives a stable `ObjectId` by truncating the
//! address rather than maintaining a side table. Collisions are possible in
//! principle but irrelevant here: the client only uses the id to label
//! decoded snapshots for the caller, never to gate verification.

use oracle_core::ids::ObjectId;
use solana_sdk::pubkey::Pubkey;

pub fn object_id_for(pubkey: &Pubkey) -> ObjectId {
    let bytes = pubkey.to_bytes();
    ObjectId(u64::from_le_bytes(bytes[..8].try_into().unwrap()))
}
