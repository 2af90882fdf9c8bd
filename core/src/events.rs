//! Structured events. Event shapes are stable: for several consumers they
//! are the only programmatic read path, so fields are additive-only once
//! shipped.

use crate::ids::{FeedId, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    QuoteVerified {
        timestamp_ms: u64,
        slot: u64,
        feed_id: FeedId,
        oracles: Vec<ObjectId>,
        queue: ObjectId,
    },
    SignatureInvalid {
        signature: [u8; 65],
        oracle_id: ObjectId,
    },
    AggregatorAuthorityUpdated {
        aggregator: ObjectId,
        new_authority: ObjectId,
    },
    QueueAuthorityUpdated {
        queue: ObjectId,
        new_authority: ObjectId,
    },
    QueueFeeTypeAdded {
        queue: ObjectId,
        coin_type: String,
    },
    QueueFeeTypeRemoved {
        queue: ObjectId,
        coin_type: String,
    },
    QueueCreated {
        queue: ObjectId,
        authority: ObjectId,
    },
}
