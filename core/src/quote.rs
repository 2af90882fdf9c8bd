//! Verified quotes and the bundle the submit engine produces.

use crate::decimal::Decimal;
use crate::ids::{FeedId, ObjectId};

/// A verified `(feed_id, value, timestamp, slot)` record. Immutable once
/// created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quote {
    pub feed_id: FeedId,
    pub result: Decimal,
    pub timestamp_ms: u64,
    pub slot: u64,
}

/// The output of a single submit-engine call: the quotes that cleared
/// `min_oracle_samples`, and the committee (valid-set) that produced them.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quotes {
    pub quotes: Vec<Quote>,
    pub oracles: Vec<ObjectId>,
    pub queue_id: ObjectId,
}
