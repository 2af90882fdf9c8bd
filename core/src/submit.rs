//! Quote Submit Engine: assembles per-feed quotes from a committee
//! submission.
//!
//! The wire API exposes discrete `run_1 .. run_6` entry points (spec.md
//! §4.5/§9) because the host this was originally written for lacks
//! variable-length polymorphic object references. Internally everything
//! funnels through [`run`], which takes `&[&Oracle]` uniformly — the
//! discrete entry points are a thin, generated-looking dispatch shim kept
//! only to preserve the external arity-limited surface and its gas-cost
//! parity.

use crate::decimal::Decimal;
use crate::error::CoreError;
use crate::events::Event;
use crate::hasher::{consensus_message_digest, FeedEntry};
use crate::host::{Clock, EventSink};
use crate::ids::{FeedId, ObjectId};
use crate::oracle::Oracle;
use crate::queue::Queue;
use crate::quote::{Quote, Quotes};
use crate::signature::{verify_committee, OracleDescriptor, RawSignature};

/// Upper bound on committee size per submission. A policy constant, not a
/// protocol-derived one — kept at 6 to match the source's discrete
/// `run_1..run_6` dispatch and to bound signature-recovery work per call.
pub const MAX_COMMITTEE_SIZE: usize = 6;

/// Assembles a committee of `oracles`, re-derives the canonical consensus
/// digest, recovers and checks each signature, and emits one [`Quote`] per
/// feed whose surviving committee meets `min_oracle_samples[i]`.
///
/// Structural failures (bad committee arity, queue mismatch, expired
/// oracle, mismatched array lengths) abort before any `Quote` is built.
/// Per-feed threshold misses and per-signature mismatches are evidentiary:
/// they drop that feed / that oracle without aborting the whole call.
#[allow(clippy::too_many_arguments)]
pub fn run(
    feed_ids: &[FeedId],
    values: &[u128],
    values_neg: &[bool],
    min_oracle_samples: &[u8],
    signatures: &[RawSignature],
    slot: u64,
    timestamp_seconds: u64,
    oracles: &[&Oracle],
    queue: &Queue,
    clock: &dyn Clock,
    sink: &mut dyn EventSink,
) -> Result<Quotes, CoreError> {
    if oracles.is_empty() || oracles.len() > MAX_COMMITTEE_SIZE {
        return Err(CoreError::InvalidCommitteeArity);
    }
    if oracles.len() != signatures.len() {
        return Err(CoreError::InvalidLength);
    }

    // Per-oracle committee assembly checks (queue membership, expiry) run
    // before the value-array shape checks below, matching the order the
    // wire contract documents them in.
    let mut candidates = Vec::with_capacity(oracles.len());
    for oracle in oracles {
        oracle.assert_usable(queue.id, clock)?;
        if !queue.contains_oracle(oracle.id) {
            return Err(CoreError::QueueMismatch);
        }
        candidates.push(OracleDescriptor {
            secp256k1_key: oracle.secp256k1_key,
            oracle_id: oracle.id,
        });
    }

    if feed_ids.len() != values.len() || feed_ids.len() != min_oracle_samples.len() {
        return Err(CoreError::InvalidLength);
    }
    if values.len() != values_neg.len() {
        return Err(CoreError::InvalidLength);
    }

    let decimals: Vec<Decimal> = values
        .iter()
        .zip(values_neg.iter())
        .map(|(&magnitude, &neg)| Decimal::new(magnitude, neg))
        .collect();

    let feed_entries: Vec<FeedEntry> = feed_ids
        .iter()
        .zip(decimals.iter())
        .zip(min_oracle_samples.iter())
        .map(|((feed_id, &value), &min_samples)| FeedEntry {
            feed_id: *feed_id,
            value,
            min_oracle_samples: min_samples,
        })
        .collect();

    tracing::debug!(committee_size = oracles.len(), slot, "assembling committee for consensus digest");
    let digest = consensus_message_digest(slot, timestamp_seconds, &feed_entries);
    let valid_oracle_ids = verify_committee(&digest, signatures, &candidates, sink);
    let committee_size = valid_oracle_ids.len();
    tracing::debug!(valid = committee_size, "committee signatures verified");

    let timestamp_ms = timestamp_seconds.saturating_mul(1000);
    let mut quotes = Vec::new();
    for (i, entry) in feed_entries.iter().enumerate() {
        if (min_oracle_samples[i] as usize) <= committee_size {
            let quote = Quote {
                feed_id: entry.feed_id,
                result: decimals[i],
                timestamp_ms,
                slot,
            };
            sink.emit(Event::QuoteVerified {
                timestamp_ms,
                slot,
                feed_id: entry.feed_id,
                oracles: valid_oracle_ids.clone(),
                queue: queue.id,
            });
            quotes.push(quote);
        }
        // Otherwise: silently dropped. No error — the bundle may still
        // succeed for other feeds.
    }

    Ok(Quotes {
        quotes,
        oracles: valid_oracle_ids,
        queue_id: queue.id,
    })
}

macro_rules! run_k {
    ($name:ident, $k:expr) => {
        #[allow(clippy::too_many_arguments)]
        pub fn $name(
            feed_ids: &[FeedId],
            values: &[u128],
            values_neg: &[bool],
            min_oracle_samples: &[u8],
            signatures: &[RawSignature; $k],
            slot: u64,
            timestamp_seconds: u64,
            oracles: [&Oracle; $k],
            queue: &Queue,
            clock: &dyn Clock,
            sink: &mut dyn EventSink,
        ) -> Result<Quotes, CoreError> {
            run(
                feed_ids,
                values,
                values_neg,
                min_oracle_samples,
                signatures,
                slot,
                timestamp_seconds,
                &oracles,
                queue,
                clock,
                sink,
            )
        }
    };
}

run_k!(run_1, 1);
run_k!(run_2, 2);
run_k!(run_3, 3);
run_k!(run_4, 4);
run_k!(run_5, 5);
run_k!(run_6, 6);
