//! Verifier core for committee-signed oracle price quotes.
//!
//! This crate defines byte-exact canonical message encoding, secp256k1
//! signature recovery against a queue-registered oracle set, per-feed
//! quote-replacement policy, and an aggregator update pipeline with
//! sliding-window statistics. It does not itself talk to any particular
//! host chain — see [`host`] for the narrow trait surface a binding
//! implements.

pub mod aggregator;
pub mod decimal;
pub mod error;
pub mod events;
pub mod hasher;
pub mod host;
pub mod ids;
pub mod oracle;
pub mod queue;
pub mod quote;
pub mod quote_verifier;
pub mod signature;
pub mod submit;

pub use decimal::Decimal;
pub use error::{CoreError, CoreResult};
pub use events::Event;
pub use ids::{FeedId, MrEnclave, ObjectId, OracleKey, QueueKey, Secp256k1Key, Slothash};
pub use oracle::Oracle;
pub use quote::{Quote, Quotes};
pub use quote_verifier::QuoteVerifier;
pub use queue::{Queue, QueueConfig};
pub use aggregator::{Aggregator, AggregatorConfig, Summary};
