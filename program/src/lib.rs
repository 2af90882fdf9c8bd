//! Solana binding for the committee-signed oracle verifier. Wires
//! `oracle-core`'s `Clock`/`EventSink`/`FeePayer`/`ObjectStore` traits onto
//! real `AccountInfo`s and sysvars, and dispatches `run_k` instructions
//! into `oracle_core::submit`.
//!
//! This crate owns no verification logic of its own — every invariant and
//! edge case lives in `oracle-core` and is exercised there under ordinary
//! `#[test]`. This binding only has to get the account plumbing right.

#[cfg(feature = "bpf-entrypoint")]
pub mod entrypoint;
pub mod host;
pub mod storage;

pub use host::{SolanaClock, SolanaEventSink, SolanaFeePayer, SolanaObjectStore};
pub use storage::{
    reconstruct_oracle, reconstruct_queue, reconstruct_quote_verifier, StoredOracle, StoredQueue, StoredQuoteVerifier,
};
