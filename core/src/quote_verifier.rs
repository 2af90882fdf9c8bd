//! Per-consumer table of latest quote per feed.
//!
//! Admission is commutative across any host reordering that respects
//! causality: later timestamps win, and equal timestamps break ties on
//! slot. See spec.md §5 and §9 for the future-timestamp control-flow fix
//! applied here (the source's `continue` without advancing its loop index
//! is a bug we do not reproduce — we always advance).

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::host::{Clock, ObjectStore};
use crate::ids::{FeedId, ObjectId};
use crate::quote::{Quote, Quotes};

#[derive(Debug, Clone)]
pub struct QuoteVerifier {
    pub id: ObjectId,
    pub queue_id: ObjectId,
    quotes: BTreeMap<FeedId, Quote>,
}

impl QuoteVerifier {
    pub fn new(id: ObjectId, queue_id: ObjectId) -> Self {
        Self {
            id,
            queue_id,
            quotes: BTreeMap::new(),
        }
    }

    pub fn contains(&self, feed_id: FeedId) -> bool {
        self.quotes.contains_key(&feed_id)
    }

    pub fn get(&self, feed_id: FeedId) -> Result<Quote, CoreError> {
        self.quotes.get(&feed_id).copied().ok_or(CoreError::QuoteNotFound)
    }

    /// Admits every quote in `bundle` under the replacement rule. Future-
    /// dated quotes (relative to `clock`) are dropped silently, not
    /// structurally rejected — only a queue mismatch on the bundle itself
    /// is fatal.
    pub fn verify_quotes(&mut self, bundle: &Quotes, clock: &dyn Clock) -> Result<(), CoreError> {
        if bundle.queue_id != self.queue_id {
            return Err(CoreError::InvalidQueue);
        }
        let now_ms = clock.now_ms();
        for quote in &bundle.quotes {
            if quote.timestamp_ms > now_ms {
                continue;
            }
            match self.quotes.get(&quote.feed_id) {
                None => {
                    self.quotes.insert(quote.feed_id, *quote);
                }
                Some(existing) => {
                    let replace = quote.timestamp_ms > existing.timestamp_ms
                        || (quote.timestamp_ms == existing.timestamp_ms && quote.slot > existing.slot);
                    if replace {
                        self.quotes.insert(quote.feed_id, *quote);
                    }
                }
            }
        }
        Ok(())
    }

    /// Consumer-visible teardown (spec.md §6's `delete_verifier`). Retires
    /// the verifier's `ObjectId` through the host `ObjectStore` and drops
    /// every stored quote with it — there is no partial-teardown state.
    pub fn delete_verifier(self, store: &mut dyn ObjectStore) -> Result<(), CoreError> {
        store.deallocate(self.id)
    }
}
