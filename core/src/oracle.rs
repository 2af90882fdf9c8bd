//! Per-oracle committee-member record.

use crate::error::CoreError;
use crate::host::Clock;
use crate::ids::{MrEnclave, ObjectId, OracleKey, Secp256k1Key};

/// A committee member. Created empty by `init`; usable only after the
/// queue authority (or a guardian-attested override) populates
/// `secp256k1_key`/`mr_enclave`/`expiration_time_ms` via
/// [`crate::queue::Queue::override_oracle`]. Oracles are never destroyed —
/// expiry is the only lifecycle terminator relevant to verification.
#[derive(Debug, Clone)]
pub struct Oracle {
    pub id: ObjectId,
    pub queue_id: ObjectId,
    pub oracle_key: OracleKey,
    pub secp256k1_key: Secp256k1Key,
    pub mr_enclave: MrEnclave,
    pub expiration_time_ms: u64,
    pub valid_attestations: Vec<MrEnclave>,
}

impl Oracle {
    /// Creates a fresh, unusable oracle bound to a queue. `secp256k1_key`
    /// is all-zero and `expiration_time_ms` is zero until the queue
    /// authority overrides it.
    pub fn init(id: ObjectId, queue_id: ObjectId, oracle_key: OracleKey) -> Self {
        Self {
            id,
            queue_id,
            oracle_key,
            secp256k1_key: Secp256k1Key([0u8; 64]),
            mr_enclave: MrEnclave([0u8; 32]),
            expiration_time_ms: 0,
            valid_attestations: Vec::new(),
        }
    }

    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        self.expiration_time_ms <= clock.now_ms()
    }

    /// Structural admission check used by both the Quote Submit Engine and
    /// the Aggregator update path: the oracle must belong to the queue in
    /// question and must not be expired.
    pub fn assert_usable(&self, queue_id: ObjectId, clock: &dyn Clock) -> Result<(), CoreError> {
        if self.queue_id != queue_id {
            return Err(CoreError::QueueMismatch);
        }
        if self.is_expired(clock) {
            return Err(CoreError::OracleInvalid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TestClock;

    #[test]
    fn fresh_oracle_is_expired() {
        let oracle = Oracle::init(ObjectId(1), ObjectId(2), OracleKey([0u8; 32]));
        let clock = TestClock { now_ms: 1, slot: 1 };
        assert!(oracle.is_expired(&clock));
    }

    #[test]
    fn queue_mismatch_is_structural() {
        let mut oracle = Oracle::init(ObjectId(1), ObjectId(2), OracleKey([0u8; 32]));
        oracle.expiration_time_ms = 1_000_000;
        let clock = TestClock { now_ms: 10, slot: 1 };
        let err = oracle.assert_usable(ObjectId(99), &clock).unwrap_err();
        assert_eq!(err, CoreError::QueueMismatch);
    }
}
