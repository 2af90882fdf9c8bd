//! The narrow host-chain surface the core consumes.
//!
//! The core never talks to object storage, clocks, or event logs directly
//! — spec.md §1 treats those as external collaborators. These four traits
//! are the whole of that surface; a consumer program implements them
//! against whatever host it runs on (Solana sysvars, an in-memory harness
//! for tests, …). `ObjectStore` is used one level up from `Queue::init`/
//! `Aggregator::init`: the host allocates an `ObjectId` through it first,
//! then passes the result in as `init`'s `id` argument — `init` itself
//! stays host-agnostic and never allocates.

use crate::error::CoreError;
use crate::events::Event;
use crate::ids::ObjectId;

pub trait Clock {
    fn now_ms(&self) -> u64;
    fn slot(&self) -> u64;
}

pub trait EventSink {
    fn emit(&mut self, event: Event);
}

/// A sink that drops everything — useful in tests that don't care about
/// the event stream.
#[derive(Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: Event) {}
}

/// Records every event in order, for assertions in tests.
#[derive(Default)]
pub struct RecordingEventSink {
    pub events: Vec<Event>,
}

impl EventSink for RecordingEventSink {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

/// Allocates and retires object identities. Backed by account creation
/// (and account closing) on a real chain; backed by a simple counter in
/// tests.
pub trait ObjectStore {
    fn allocate(&mut self) -> ObjectId;

    /// Tears down the object identified by `id`. The only consumer-visible
    /// teardown path in this model is `QuoteVerifier::delete_verifier`; no
    /// other object kind is ever deallocated.
    fn deallocate(&mut self, id: ObjectId) -> Result<(), CoreError>;
}

/// An in-memory counter, for tests that need to mint a sequence of ids.
#[derive(Default)]
pub struct CountingObjectStore {
    next: u64,
    deallocated: Vec<ObjectId>,
}

impl CountingObjectStore {
    pub fn was_deallocated(&self, id: ObjectId) -> bool {
        self.deallocated.contains(&id)
    }
}

impl ObjectStore for CountingObjectStore {
    fn allocate(&mut self) -> ObjectId {
        self.next += 1;
        ObjectId(self.next)
    }

    fn deallocate(&mut self, id: ObjectId) -> Result<(), CoreError> {
        self.deallocated.push(id);
        Ok(())
    }
}

pub trait FeePayer {
    /// Moves `amount` of `coin_type` from the payer to `recipient`. Either
    /// the whole amount is transferred or the call fails — no partial
    /// transfer exists in this model.
    fn pay(&mut self, coin_type: &str, amount: u64, recipient: ObjectId) -> Result<(), CoreError>;
}

/// A fee payer that never fails, for tests that don't exercise fee policy.
#[derive(Default)]
pub struct NullFeePayer;

impl FeePayer for NullFeePayer {
    fn pay(&mut self, _coin_type: &str, _amount: u64, _recipient: ObjectId) -> Result<(), CoreError> {
        Ok(())
    }
}

/// A fixed point in time, for deterministic tests.
pub struct TestClock {
    pub now_ms: u64,
    pub slot: u64,
}

impl Clock for TestClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn slot(&self) -> u64 {
        self.slot
    }
}
