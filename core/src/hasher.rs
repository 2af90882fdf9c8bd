//! Byte-exact canonical message assembly and SHA-256 digesting.
//!
//! Two message shapes are produced: the committee **consensus message**
//! (Quote Submit) and the single-oracle **update message** (Aggregator).
//! Both are pure functions of their inputs — no shared state survives a
//! `finalize`, and there is nothing to reuse across calls.

use sha2::{Digest, Sha256};

use crate::decimal::Decimal;
use crate::error::CoreError;
use crate::ids::{FeedId, QueueKey, Slothash};

/// Append-only byte buffer with typed pushers, mirroring the wire layout
/// the off-chain signer and on-chain verifier must agree on bit-for-bit.
#[derive(Default)]
pub struct CanonicalHasher {
    buf: Vec<u8>,
}

impl CanonicalHasher {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn push_u64_le(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn push_u32_le(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn push_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn push_i128_le(&mut self, value: i128) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the buffer and returns its SHA-256 digest. Reuse after this
    /// call is a programmer error — there's no way to append more bytes to
    /// an already-finalized digest, so we take `self` by value.
    pub fn finalize(self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.buf);
        hasher.finalize().into()
    }
}

/// One feed's worth of consensus-message payload.
pub struct FeedEntry {
    pub feed_id: FeedId,
    pub value: Decimal,
    pub min_oracle_samples: u8,
}

/// `slot || timestamp_seconds || Σ(feed_id || value_i128_le || min_samples)`.
///
/// Total length `= 16 + N * 49`.
pub fn consensus_message_digest(slot: u64, timestamp_seconds: u64, feeds: &[FeedEntry]) -> [u8; 32] {
    let mut hasher = CanonicalHasher::new();
    hasher.push_u64_le(slot).push_u64_le(timestamp_seconds);
    for feed in feeds {
        hasher
            .push_bytes(feed.feed_id.as_bytes())
            .push_i128_le(feed.value.to_i128())
            .push_u8(feed.min_oracle_samples);
    }
    debug_assert_eq!(hasher.len(), 16 + feeds.len() * 49);
    hasher.finalize()
}

/// Returns the raw, un-hashed consensus message bytes — exposed for tests
/// and for consumers that want to verify byte offsets directly.
pub fn consensus_message_bytes(slot: u64, timestamp_seconds: u64, feeds: &[FeedEntry]) -> Vec<u8> {
    let mut hasher = CanonicalHasher::new();
    hasher.push_u64_le(slot).push_u64_le(timestamp_seconds);
    for feed in feeds {
        hasher
            .push_bytes(feed.feed_id.as_bytes())
            .push_i128_le(feed.value.to_i128())
            .push_u8(feed.min_oracle_samples);
    }
    hasher.as_bytes().to_vec()
}

/// `queue_key || feed_hash || value_i128_le || slothash || max_variance_le || min_responses_le || timestamp_le`.
///
/// Total length `= 132`.
pub fn update_message_digest(
    queue_key: &QueueKey,
    feed_hash: &FeedId,
    value: Decimal,
    slothash: &Slothash,
    max_variance: u64,
    min_responses: u32,
    timestamp: u64,
) -> Result<[u8; 32], CoreError> {
    let mut hasher = CanonicalHasher::new();
    hasher
        .push_bytes(queue_key.as_bytes())
        .push_bytes(feed_hash.as_bytes())
        .push_i128_le(value.to_i128())
        .push_bytes(slothash.as_bytes())
        .push_u64_le(max_variance)
        .push_u32_le(min_responses)
        .push_u64_le(timestamp);
    debug_assert_eq!(hasher.len(), 132);
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_feed_offsets_match_fixture() {
        let feed_id = FeedId([0x01; 32]);
        let feeds = [FeedEntry {
            feed_id,
            value: Decimal::new(66_681_990_000_000_000_000_000, false),
            min_oracle_samples: 1,
        }];
        let bytes = consensus_message_bytes(1234567890, 1729903069, &feeds);
        assert_eq!(bytes.len(), 65);
        assert_eq!(&bytes[0..8], &1234567890u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &1729903069u64.to_le_bytes());
        assert_eq!(&bytes[16..48], feed_id.as_bytes());
        assert_eq!(
            &bytes[48..64],
            &Decimal::new(66_681_990_000_000_000_000_000, false).to_le_bytes()
        );
        assert_eq!(bytes[64], 1);
    }

    #[test]
    fn multi_feed_offsets_match_fixture() {
        let feeds = [
            FeedEntry {
                feed_id: FeedId([0x01; 32]),
                value: Decimal::new(66_681_990_000_000_000_000_000, false),
                min_oracle_samples: 1,
            },
            FeedEntry {
                feed_id: FeedId([0x02; 32]),
                value: Decimal::new(12345, true),
                min_oracle_samples: 3,
            },
        ];
        let bytes = consensus_message_bytes(1234567890, 1729903069, &feeds);
        assert_eq!(bytes.len(), 16 + 49 * 2);
        assert_eq!(&bytes[65..97], feeds[1].feed_id.as_bytes());
        let second_value = u128::from_le_bytes(bytes[97..113].try_into().unwrap());
        assert_eq!(second_value, 0u128.wrapping_sub(12345));
        assert_eq!(bytes[113], 3);
    }

    #[test]
    fn update_message_is_132_bytes() {
        let digest = update_message_digest(
            &QueueKey([0xAA; 32]),
            &FeedId([0xBB; 32]),
            Decimal::new(66_681_990_000_000_000_000_000, false),
            &Slothash::default(),
            5_000_000_000,
            1,
            1729903069,
        )
        .unwrap();
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn digest_is_deterministic() {
        let feeds = [FeedEntry {
            feed_id: FeedId([0x03; 32]),
            value: Decimal::new(42, false),
            min_oracle_samples: 2,
        }];
        let a = consensus_message_digest(1, 2, &feeds);
        let b = consensus_message_digest(1, 2, &feeds);
        assert_eq!(a, b);
    }
}
