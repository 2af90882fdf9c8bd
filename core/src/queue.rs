//! Registry of admitted oracles, fee policy, and attestation threshold.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreError;
use crate::events::Event;
use crate::host::{Clock, EventSink};
use crate::ids::{MrEnclave, ObjectId, OracleKey, QueueKey, Secp256k1Key};
use crate::oracle::Oracle;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub min_attestations: u32,
    pub oracle_validity_length_ms: u64,
    pub fee: u64,
    pub fee_recipient: ObjectId,
    pub guardian_queue_id: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct Queue {
    pub id: ObjectId,
    pub queue_key: QueueKey,
    pub authority: ObjectId,
    pub name: String,
    pub fee: u64,
    pub fee_recipient: ObjectId,
    pub min_attestations: u32,
    pub oracle_validity_length_ms: u64,
    pub guardian_queue_id: Option<ObjectId>,
    pub is_guardian: bool,
    /// oracle_id -> oracle_key. Membership here is the sole admission
    /// criterion for an oracle's signature.
    existing_oracles: BTreeMap<ObjectId, OracleKey>,
    fee_types: BTreeSet<String>,
    pub last_queue_override_ms: u64,
}

impl Queue {
    pub fn init(
        id: ObjectId,
        queue_key: QueueKey,
        authority: ObjectId,
        name: String,
        config: QueueConfig,
        is_guardian: bool,
        sink: &mut dyn EventSink,
    ) -> Result<Self, CoreError> {
        if config.min_attestations == 0 {
            return Err(CoreError::InvalidMinAttestations);
        }
        if config.oracle_validity_length_ms == 0 {
            return Err(CoreError::InvalidOracleValidityLength);
        }
        let queue = Self {
            id,
            queue_key,
            authority,
            name,
            fee: config.fee,
            fee_recipient: config.fee_recipient,
            min_attestations: config.min_attestations,
            oracle_validity_length_ms: config.oracle_validity_length_ms,
            guardian_queue_id: config.guardian_queue_id,
            is_guardian,
            existing_oracles: BTreeMap::new(),
            fee_types: BTreeSet::new(),
            last_queue_override_ms: 0,
        };
        sink.emit(Event::QueueCreated { queue: id, authority });
        Ok(queue)
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
        tracing::info!(queue = self.id.0, new_authority = new_authority.0, "queue authority updated");
        sink.emit(Event::QueueAuthorityUpdated { queue: self.id, new_authority });
        Ok(())
    }

    pub fn set_configs(&mut self, caller: ObjectId, config: QueueConfig) -> Result<(), CoreError> {
        self.assert_authority(caller)?;
        if config.min_attestations == 0 {
            return Err(CoreError::InvalidMinAttestations);
        }
        if config.oracle_validity_length_ms == 0 {
            return Err(CoreError::InvalidOracleValidityLength);
        }
        self.min_attestations = config.min_attestations;
        self.oracle_validity_length_ms = config.oracle_validity_length_ms;
        self.fee = config.fee;
        self.fee_recipient = config.fee_recipient;
        self.guardian_queue_id = config.guardian_queue_id;
        Ok(())
    }

    pub fn add_fee_coin(&mut self, caller: ObjectId, coin_type: String, sink: &mut dyn EventSink) -> Result<(), CoreError> {
        self.assert_authority(caller)?;
        self.fee_types.insert(coin_type.clone());
        sink.emit(Event::QueueFeeTypeAdded { queue: self.id, coin_type });
        Ok(())
    }

    pub fn remove_fee_coin(&mut self, caller: ObjectId, coin_type: &str, sink: &mut dyn EventSink) -> Result<(), CoreError> {
        self.assert_authority(caller)?;
        self.fee_types.remove(coin_type);
        sink.emit(Event::QueueFeeTypeRemoved {
            queue: self.id,
            coin_type: coin_type.to_string(),
        });
        Ok(())
    }

    pub fn accepts_fee_coin(&self, coin_type: &str) -> bool {
        self.fee_types.contains(coin_type)
    }

    pub fn contains_oracle(&self, oracle_id: ObjectId) -> bool {
        self.existing_oracles.contains_key(&oracle_id)
    }

    /// Seeds oracle membership without the authority/expiry checks
    /// `override_oracle` otherwise enforces. Used only when reconstructing a
    /// `Queue` from persisted state for the duration of one instruction —
    /// the membership was already established by a prior, real
    /// `override_oracle` call; this just carries it across the
    /// deserialize boundary.
    pub fn restore_oracle_membership(&mut self, oracle_id: ObjectId, oracle_key: OracleKey) {
        self.existing_oracles.insert(oracle_id, oracle_key);
    }

    /// The only path by which an Oracle's `(secp256k1_key, mr_enclave,
    /// expiration_time_ms)` may change. Inserts the oracle into
    /// `existing_oracles` if absent; `oracle_key` is preserved across
    /// overrides.
    pub fn override_oracle(
        &mut self,
        caller: ObjectId,
        oracle: &mut Oracle,
        new_secp_key: Secp256k1Key,
        new_mr_enclave: MrEnclave,
        new_expiration_ms: u64,
        clock: &dyn Clock,
    ) -> Result<(), CoreError> {
        self.assert_authority(caller)?;
        if oracle.queue_id != self.id {
            return Err(CoreError::QueueMismatch);
        }
        if new_expiration_ms <= clock.now_ms() {
            return Err(CoreError::OracleInvalid);
        }
        oracle.secp256k1_key = new_secp_key;
        oracle.mr_enclave = new_mr_enclave;
        oracle.expiration_time_ms = new_expiration_ms;
        self.existing_oracles.insert(oracle.id, oracle.oracle_key);
        self.last_queue_override_ms = clock.now_ms();
        tracing::info!(oracle = oracle.id.0, queue = self.id.0, "oracle re-attested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NullEventSink, TestClock};

    fn test_config() -> QueueConfig {
        QueueConfig {
            min_attestations: 1,
            oracle_validity_length_ms: 60_000,
            fee: 0,
            fee_recipient: ObjectId(1),
            guardian_queue_id: None,
        }
    }

    #[test]
    fn init_rejects_zero_min_attestations() {
        let mut sink = NullEventSink;
        let mut cfg = test_config();
        cfg.min_attestations = 0;
        let err = Queue::init(ObjectId(1), QueueKey([0u8; 32]), ObjectId(1), "q".into(), cfg, false, &mut sink)
            .unwrap_err();
        assert_eq!(err, CoreError::InvalidMinAttestations);
    }

    #[test]
    fn override_oracle_rejects_non_authority() {
        let mut sink = NullEventSink;
        let mut queue = Queue::init(ObjectId(1), QueueKey([0u8; 32]), ObjectId(1), "q".into(), test_config(), false, &mut sink).unwrap();
        let mut oracle = Oracle::init(ObjectId(2), ObjectId(1), OracleKey([0u8; 32]));
        let clock = TestClock { now_ms: 1, slot: 1 };
        let err = queue
            .override_oracle(ObjectId(99), &mut oracle, Secp256k1Key([1u8; 64]), MrEnclave([1u8; 32]), 10_000, &clock)
            .unwrap_err();
        assert_eq!(err, CoreError::InvalidAuthority);
    }

    #[test]
    fn override_oracle_rejects_past_expiration() {
        let mut sink = NullEventSink;
        let mut queue = Queue::init(ObjectId(1), QueueKey([0u8; 32]), ObjectId(1), "q".into(), test_config(), false, &mut sink).unwrap();
        let mut oracle = Oracle::init(ObjectId(2), ObjectId(1), OracleKey([0u8; 32]));
        let clock = TestClock { now_ms: 10_000, slot: 1 };
        let err = queue
            .override_oracle(ObjectId(1), &mut oracle, Secp256k1Key([1u8; 64]), MrEnclave([1u8; 32]), 9_999, &clock)
            .unwrap_err();
        assert_eq!(err, CoreError::OracleInvalid);
    }

    #[test]
    fn override_oracle_inserts_into_existing_oracles() {
        let mut sink = NullEventSink;
        let mut queue = Queue::init(ObjectId(1), QueueKey([0u8; 32]), ObjectId(1), "q".into(), test_config(), false, &mut sink).unwrap();
        let mut oracle = Oracle::init(ObjectId(2), ObjectId(1), OracleKey([7u8; 32]));
        let clock = TestClock { now_ms: 1, slot: 1 };
        assert!(!queue.contains_oracle(ObjectId(2)));
        queue
            .override_oracle(ObjectId(1), &mut oracle, Secp256k1Key([1u8; 64]), MrEnclave([1u8; 32]), 10_000, &clock)
            .unwrap();
        assert!(queue.contains_oracle(ObjectId(2)));
        assert_eq!(queue.last_queue_override_ms, 1);
    }
}
