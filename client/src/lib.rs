//! Off-chain client for the committee-signed oracle protocol implemented by
//! `oracle-core`.
//!
//! This crate never re-implements verification — it only fetches and
//! decodes on-chain state, talks to the external Crossbar aggregation
//! service, and assembles `run_k` transaction instructions. Everything
//! here is a thin wrapper around `solana-client`/`solana-sdk`, in the same
//! spirit as `switchboard-on-demand-client`.

pub mod crossbar;
pub mod ids;
pub mod oracle;
pub mod queue;
pub mod submit;

pub use crossbar::{CrossbarClient, CrossbarError, HttpCrossbarClient, SignedQuoteBundle};
pub use ids::object_id_for;
pub use oracle::{OracleAccountData, OracleSnapshot};
pub use queue::{OracleQueueHandle, QueueAccountData, QueueSnapshot};
pub use submit::SubmitBuilder;
