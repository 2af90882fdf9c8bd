//! Single-feed submission path: one oracle's signed update at a time,
//! folded into a fixed-capacity ring and reduced to rolling statistics.

use std::collections::BTreeSet;

use crate::decimal::Decimal;
use crate::error::CoreError;
use crate::events::Event;
use crate::hasher::update_message_digest;
use crate::host::{Clock, EventSink, FeePayer};
use crate::ids::{FeedId, ObjectId, QueueKey, Slothash};
use crate::oracle::Oracle;
use crate::queue::Queue;
use crate::signature::{recover_secp256k1_key, RawSignature};

/// `max_variance` is expressed on the same 1e9 basis the client library
/// uses; this is the scaling factor applied to the population stdev
/// before comparing it against the configured ceiling.
pub const VARIANCE_SCALE: u128 = 1_000_000_000;

/// Integer floor square root via Newton's method. Used in place of
/// `f64::sqrt` so `recompute`'s variance gate never loses precision to a
/// lossy integer-to-float cast at large price magnitudes.
fn isqrt(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[derive(Debug, Clone, Copy)]
struct RingEntry {
    oracle: ObjectId,
    value: Decimal,
    timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub result: Decimal,
    pub mean: Decimal,
    pub range: Decimal,
    pub stdev: Decimal,
    pub min_result: Decimal,
    pub max_result: Decimal,
    pub min_timestamp_ms: u64,
    pub max_timestamp_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub min_sample_size: usize,
    pub max_staleness_seconds: u64,
    pub max_variance: u64,
    pub min_responses: u32,
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    pub id: ObjectId,
    pub authority: ObjectId,
    pub queue_id: ObjectId,
    pub feed_hash: FeedId,
    pub name: String,
    pub created_at_ms: u64,
    pub min_sample_size: usize,
    pub max_staleness_seconds: u64,
    pub max_variance: u64,
    pub min_responses: u32,
    current_result: Option<Summary>,
    ring: Vec<Option<RingEntry>>,
    curr_idx: usize,
    populated: usize,
}

impl Aggregator {
    pub fn init(
        id: ObjectId,
        authority: ObjectId,
        queue_id: ObjectId,
        feed_hash: FeedId,
        name: String,
        created_at_ms: u64,
        config: AggregatorConfig,
    ) -> Result<Self, CoreError> {
        if config.min_sample_size == 0 {
            return Err(CoreError::InvalidMinAttestations);
        }
        Ok(Self {
            id,
            authority,
            queue_id,
            feed_hash,
            name,
            created_at_ms,
            min_sample_size: config.min_sample_size,
            max_staleness_seconds: config.max_staleness_seconds,
            max_variance: config.max_variance,
            min_responses: config.min_responses,
            current_result: None,
            ring: vec![None; config.min_sample_size],
            curr_idx: 0,
            populated: 0,
        })
    }

    fn assert_authority(&self, caller: ObjectId) -> Result<(), CoreError> {
        if caller != self.authority {
            return Err(CoreError::InvalidAuthority);
        }
        Ok(())
    }

    pub fn set_authority(&mut self, caller: ObjectId, new_authority: ObjectId, sink: &mut dyn EventSink) -> Result<(), CoreError> {
        self.assert_authority(caller)?;
        self.authority = new_authority;
        sink.emit(Event::AggregatorAuthorityUpdated {
            aggregator: self.id,
            new_authority,
        });
        Ok(())
    }

    pub fn set_configs(&mut self, caller: ObjectId, config: AggregatorConfig) -> Result<(), CoreError> {
        self.assert_authority(caller)?;
        if config.min_sample_size == 0 {
            return Err(CoreError::InvalidMinAttestations);
        }
        self.max_staleness_seconds = config.max_staleness_seconds;
        self.max_variance = config.max_variance;
        self.min_responses = config.min_responses;
        // Resizing the ring mid-flight would discard history unpredictably;
        // the source does not support it either, so neither do we.
        if config.min_sample_size != self.min_sample_size {
            self.min_sample_size = config.min_sample_size;
            self.ring = vec![None; config.min_sample_size];
            self.curr_idx = 0;
            self.populated = 0;
            self.current_result = None;
        }
        Ok(())
    }

    /// Only the last-exposed [`Summary`] that has also cleared the
    /// `min_responses`/`max_variance` gates. See spec.md §4.7/§9: the
    /// source treats `max_variance` as a divergence filter and
    /// `min_responses` as the on-chain validity gate; we honor both by
    /// withholding exposure (not the underlying statistics) when either
    /// gate fails, so a later update can still tighten the spread and
    /// start exposing again.
    pub fn current_result(&self) -> Option<Summary> {
        self.current_result
    }

    /// Validates a single-oracle update message, folds it into the ring,
    /// and recomputes statistics once the ring is populated.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_result(
        &mut self,
        queue: &Queue,
        queue_key: &QueueKey,
        value: Decimal,
        timestamp: u64,
        oracle: &Oracle,
        signature: &RawSignature,
        clock: &dyn Clock,
        fee_coin_type: &str,
        fee_payer: &mut dyn FeePayer,
    ) -> Result<(), CoreError> {
        if oracle.queue_id != queue.id {
            return Err(CoreError::QueueMismatch);
        }
        oracle.assert_usable(queue.id, clock)?;
        if !queue.contains_oracle(oracle.id) {
            return Err(CoreError::QueueMismatch);
        }
        if timestamp > clock.now_ms() / 1000 {
            // Future-dated updates are dropped silently, mirroring the
            // Quote Submit path's treatment of future timestamps.
            return Ok(());
        }
        if !queue.accepts_fee_coin(fee_coin_type) {
            return Err(CoreError::FeeType);
        }

        let digest = update_message_digest(
            queue_key,
            &self.feed_hash,
            value,
            &Slothash::default(),
            self.max_variance,
            self.min_responses,
            timestamp,
        )?;
        let recovered = recover_secp256k1_key(&digest, signature);
        if recovered != Some(oracle.secp256k1_key.0) {
            // Evidentiary: the update is simply not admitted: there is
            // nothing else the engine can learn from one bad signature.
            tracing::warn!(oracle = oracle.id.0, aggregator = self.id.0, "aggregator update signature mismatch");
            return Ok(());
        }

        fee_payer.pay(fee_coin_type, queue.fee, queue.fee_recipient)?;

        let timestamp_ms = timestamp.saturating_mul(1000);
        self.ring[self.curr_idx] = Some(RingEntry {
            oracle: oracle.id,
            value,
            timestamp_ms,
        });
        self.curr_idx = (self.curr_idx + 1) % self.ring.len();
        self.populated = (self.populated + 1).min(self.ring.len());

        if self.populated >= self.min_sample_size {
            self.recompute();
        }
        Ok(())
    }

    fn recompute(&mut self) {
        let entries: Vec<RingEntry> = self.ring.iter().filter_map(|e| *e).collect();
        if entries.is_empty() {
            return;
        }
        let mut values: Vec<i128> = entries.iter().map(|e| e.value.to_i128()).collect();
        values.sort_unstable();
        let n = values.len();

        let min_v = values[0];
        let max_v = values[n - 1];
        let range = max_v.saturating_sub(min_v).max(0);
        let sum: i128 = values.iter().sum();
        let mean = sum / n as i128;

        // Integer-domain variance: at the price magnitudes this feed sees
        // (~1e22), casting to f64 loses precision below the ~8e6 ULP at
        // that range and silently collapses tightly-clustered diffs to
        // zero, understating stdev. `saturating_sub`/`checked_mul` keep
        // the per-sample squared deviation exact (or pinned to `u128::MAX`
        // on the pathological all-values-far-from-mean case) instead.
        let mut sum_sq: u128 = 0;
        for &v in &values {
            let diff = v.saturating_sub(mean).unsigned_abs();
            let diff_sq = diff.checked_mul(diff).unwrap_or(u128::MAX);
            sum_sq = sum_sq.saturating_add(diff_sq);
        }
        let variance = sum_sq / n as u128;
        let stdev_i128 = isqrt(variance) as i128;

        // Lower-median policy for even n (spec.md §9 open question).
        let median = if n % 2 == 1 {
            values[n / 2]
        } else {
            values[n / 2 - 1]
        };

        let min_timestamp_ms = entries.iter().map(|e| e.timestamp_ms).min().unwrap();
        let max_timestamp_ms = entries.iter().map(|e| e.timestamp_ms).max().unwrap();

        let summary = Summary {
            result: Decimal::from_i128(median),
            mean: Decimal::from_i128(mean),
            range: Decimal::from_i128(range),
            stdev: Decimal::from_i128(stdev_i128),
            min_result: Decimal::from_i128(min_v),
            max_result: Decimal::from_i128(max_v),
            min_timestamp_ms,
            max_timestamp_ms,
        };

        let distinct_oracles: BTreeSet<ObjectId> = entries.iter().map(|e| e.oracle).collect();
        let scaled_stdev = (stdev_i128.unsigned_abs()).saturating_mul(VARIANCE_SCALE);
        let within_variance = scaled_stdev <= self.max_variance as u128;
        let enough_responses = distinct_oracles.len() as u32 >= self.min_responses;

        if within_variance && enough_responses {
            self.current_result = Some(summary);
        }
        // Otherwise: the freshly computed summary is withheld; the
        // previously exposed one (if any) keeps serving reads until a
        // later update tightens the spread or gathers more distinct
        // responses.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NullEventSink, NullFeePayer, TestClock};
    use crate::ids::{MrEnclave, OracleKey, Secp256k1Key};
    use crate::queue::QueueConfig;
    use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey};
    use k256::elliptic_curve::sec1::ToEncodedPoint;

    fn make_queue() -> Queue {
        let mut sink = NullEventSink;
        let mut queue = Queue::init(
            ObjectId(1),
            QueueKey([0u8; 32]),
            ObjectId(1),
            "q".into(),
            QueueConfig {
                min_attestations: 1,
                oracle_validity_length_ms: 60_000,
                fee: 0,
                fee_recipient: ObjectId(2),
                guardian_queue_id: None,
            },
            false,
            &mut sink,
        )
        .unwrap();
        queue.add_fee_coin(ObjectId(1), "USDC".into(), &mut sink).unwrap();
        queue
    }

    fn make_oracle(queue: &mut Queue, clock: &dyn Clock, seed: u8, id: u64) -> (Oracle, SigningKey) {
        let key = SigningKey::from_bytes(&[seed; 32].into()).unwrap();
        let encoded = key.verifying_key().to_encoded_point(false);
        let mut xy = [0u8; 64];
        xy.copy_from_slice(&encoded.as_bytes()[1..65]);
        let mut oracle = Oracle::init(ObjectId(id), queue.id, OracleKey([seed; 32]));
        queue
            .override_oracle(
                queue.authority,
                &mut oracle,
                Secp256k1Key(xy),
                MrEnclave([0u8; 32]),
                10_000_000_000_000,
                clock,
            )
            .unwrap();
        (oracle, key)
    }

    fn sign_update(
        key: &SigningKey,
        queue_key: &QueueKey,
        feed_hash: &FeedId,
        value: Decimal,
        max_variance: u64,
        min_responses: u32,
        timestamp: u64,
    ) -> RawSignature {
        let digest = update_message_digest(
            queue_key,
            feed_hash,
            value,
            &Slothash::default(),
            max_variance,
            min_responses,
            timestamp,
        )
        .unwrap();
        let (sig, recovery_id): (K256Signature, RecoveryId) =
            key.sign_prehash_recoverable(&digest).unwrap();
        let mut raw = [0u8; 65];
        raw[..64].copy_from_slice(&sig.to_bytes());
        raw[64] = recovery_id.to_byte();
        RawSignature(raw)
    }

    #[test]
    fn first_update_does_not_overwrite_with_zero_samples() {
        let mut queue = make_queue();
        let queue_key = QueueKey([0u8; 32]);
        let feed_hash = FeedId([9u8; 32]);
        let mut agg = Aggregator::init(
            ObjectId(5),
            ObjectId(1),
            queue.id,
            feed_hash,
            "feed".into(),
            0,
            AggregatorConfig {
                min_sample_size: 3,
                max_staleness_seconds: 60,
                max_variance: u64::MAX,
                min_responses: 1,
            },
        )
        .unwrap();
        assert!(agg.current_result().is_none());

        let clock = TestClock { now_ms: 1_000, slot: 1 };
        let (oracle, key) = make_oracle(&mut queue, &clock, 1, 10);
        let sig = sign_update(&key, &queue_key, &feed_hash, Decimal::new(100, false), u64::MAX, 1, 1);
        let mut fee_payer = NullFeePayer;
        agg.submit_result(&queue, &queue_key, Decimal::new(100, false), 1, &oracle, &sig, &clock, "USDC", &mut fee_payer)
            .unwrap();
        assert!(agg.current_result().is_none(), "summary must not appear before ring fills");
    }

    #[test]
    fn recomputes_after_ring_fills_and_median_is_lower_for_even_n() {
        let mut queue = make_queue();
        let queue_key = QueueKey([0u8; 32]);
        let feed_hash = FeedId([9u8; 32]);
        let mut agg = Aggregator::init(
            ObjectId(5),
            ObjectId(1),
            queue.id,
            feed_hash,
            "feed".into(),
            0,
            AggregatorConfig {
                min_sample_size: 4,
                max_staleness_seconds: 60,
                max_variance: u64::MAX,
                min_responses: 1,
            },
        )
        .unwrap();
        let clock = TestClock { now_ms: 1_000_000, slot: 1 };
        let mut fee_payer = NullFeePayer;

        let values = [10i128, 20, 30, 40];
        for (i, &v) in values.iter().enumerate() {
            let (oracle, key) = make_oracle(&mut queue, &clock, i as u8 + 1, 100 + i as u64);
            let decimal = Decimal::from_i128(v);
            let ts = (i + 1) as u64;
            let sig = sign_update(&key, &queue_key, &feed_hash, decimal, u64::MAX, 1, ts);
            agg.submit_result(&queue, &queue_key, decimal, ts, &oracle, &sig, &clock, "USDC", &mut fee_payer)
                .unwrap();
        }

        let summary = agg.current_result().expect("ring full, summary should exist");
        assert_eq!(summary.min_result, Decimal::from_i128(10));
        assert_eq!(summary.max_result, Decimal::from_i128(40));
        assert_eq!(summary.range, Decimal::from_i128(30));
        assert_eq!(summary.mean, Decimal::from_i128(25));
        // lower-median of [10,20,30,40] is 20
        assert_eq!(summary.result, Decimal::from_i128(20));
    }

    /// At price magnitudes the spec's own fixtures use (~6.67e22, see
    /// `hasher.rs`'s scenario-1 value), an `f64` cast collapses diffs
    /// below its ~8e6 ULP at that range to zero — four samples clustered
    /// within a few million units of each other would wrongly report
    /// `stdev == 0`. The integer-domain computation must not do that.
    #[test]
    fn stdev_stays_precise_at_large_price_magnitudes() {
        let mut queue = make_queue();
        let queue_key = QueueKey([0u8; 32]);
        let feed_hash = FeedId([9u8; 32]);
        let mut agg = Aggregator::init(
            ObjectId(5),
            ObjectId(1),
            queue.id,
            feed_hash,
            "feed".into(),
            0,
            AggregatorConfig {
                min_sample_size: 4,
                max_staleness_seconds: 60,
                max_variance: u64::MAX,
                min_responses: 1,
            },
        )
        .unwrap();
        let clock = TestClock { now_ms: 1_000_000, slot: 1 };
        let mut fee_payer = NullFeePayer;

        let base: i128 = 66_681_990_000_000_000_000_000;
        let offsets = [0i128, 1_000_000, 2_000_000, 3_000_000];
        for (i, &offset) in offsets.iter().enumerate() {
            let (oracle, key) = make_oracle(&mut queue, &clock, i as u8 + 1, 100 + i as u64);
            let decimal = Decimal::from_i128(base + offset);
            let ts = (i + 1) as u64;
            let sig = sign_update(&key, &queue_key, &feed_hash, decimal, u64::MAX, 1, ts);
            agg.submit_result(&queue, &queue_key, decimal, ts, &oracle, &sig, &clock, "USDC", &mut fee_payer)
                .unwrap();
        }

        let summary = agg.current_result().expect("ring full, summary should exist");
        // variance = mean((d - mean)^2) over diffs [-1.5e6, -0.5e6, 0.5e6, 1.5e6]
        // = (2.25e12 + 0.25e12 + 0.25e12 + 2.25e12) / 4 = 1.25e12, isqrt ~= 1_118_033
        let stdev = summary.stdev.to_i128();
        assert!(stdev > 1_000_000, "stdev collapsed to near-zero: {stdev}");
        assert!(stdev < 1_200_000, "stdev unexpectedly large: {stdev}");
    }

    #[test]
    fn rejects_unapproved_fee_coin() {
        let mut queue = make_queue();
        let queue_key = QueueKey([0u8; 32]);
        let feed_hash = FeedId([9u8; 32]);
        let mut agg = Aggregator::init(
            ObjectId(5),
            ObjectId(1),
            queue.id,
            feed_hash,
            "feed".into(),
            0,
            AggregatorConfig {
                min_sample_size: 1,
                max_staleness_seconds: 60,
                max_variance: u64::MAX,
                min_responses: 1,
            },
        )
        .unwrap();
        let clock = TestClock { now_ms: 1_000, slot: 1 };
        let (oracle, key) = make_oracle(&mut queue, &clock, 1, 10);
        let sig = sign_update(&key, &queue_key, &feed_hash, Decimal::new(1, false), u64::MAX, 1, 1);
        let mut fee_payer = NullFeePayer;
        let err = agg
            .submit_result(&queue, &queue_key, Decimal::new(1, false), 1, &oracle, &sig, &clock, "DAI", &mut fee_payer)
            .unwrap_err();
        assert_eq!(err, CoreError::FeeType);
    }

    #[test]
    fn rejects_oracle_not_in_queue_registry() {
        let queue = make_queue();
        let queue_key = QueueKey([0u8; 32]);
        let feed_hash = FeedId([9u8; 32]);
        let mut agg = Aggregator::init(
            ObjectId(5),
            ObjectId(1),
            queue.id,
            feed_hash,
            "feed".into(),
            0,
            AggregatorConfig {
                min_sample_size: 1,
                max_staleness_seconds: 60,
                max_variance: u64::MAX,
                min_responses: 1,
            },
        )
        .unwrap();
        let clock = TestClock { now_ms: 1_000, slot: 1 };
        let key = SigningKey::from_bytes(&[3u8; 32].into()).unwrap();
        let encoded = key.verifying_key().to_encoded_point(false);
        let mut xy = [0u8; 64];
        xy.copy_from_slice(&encoded.as_bytes()[1..65]);
        let mut oracle = Oracle::init(ObjectId(10), queue.id, OracleKey([3u8; 32]));
        oracle.secp256k1_key = Secp256k1Key(xy);
        oracle.mr_enclave = MrEnclave([0u8; 32]);
        oracle.expiration_time_ms = 10_000_000_000_000;
        assert!(!queue.contains_oracle(oracle.id));

        let sig = sign_update(&key, &queue_key, &feed_hash, Decimal::new(1, false), u64::MAX, 1, 1);
        let mut fee_payer = NullFeePayer;
        let err = agg
            .submit_result(&queue, &queue_key, Decimal::new(1, false), 1, &oracle, &sig, &clock, "USDC", &mut fee_payer)
            .unwrap_err();
        assert_eq!(err, CoreError::QueueMismatch);
    }
}
