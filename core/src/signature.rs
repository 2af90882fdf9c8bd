//! secp256k1 ecrecover against a queue-registered oracle set.
//!
//! Verification is positional: `sigs[i]` is checked against `OD[i]`'s
//! stored key. Callers MUST NOT reorder either array independently — the
//! committee-assembly code in [`crate::submit`] is the only place that
//! constructs both, in lockstep.

use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::events::Event;
use crate::host::EventSink;
use crate::ids::{ObjectId, Secp256k1Key};

/// One committee candidate: the oracle's stored key and its identity, in
/// the order the consensus digest expects.
#[derive(Debug, Clone, Copy)]
pub struct OracleDescriptor {
    pub secp256k1_key: Secp256k1Key,
    pub oracle_id: ObjectId,
}

/// A 65-byte `r || s || v` secp256k1 signature over a canonical digest.
#[derive(Debug, Clone, Copy)]
pub struct RawSignature(pub [u8; 65]);

impl RawSignature {
    /// The recovery byte is the signature's 65th byte. A more robust
    /// verifier extracts it rather than assuming a fixed value; see
    /// spec.md §9 "Recovery-id handling".
    fn recovery_byte(&self) -> u8 {
        self.0[64]
    }

    fn rs(&self) -> &[u8; 64] {
        self.0[..64].try_into().unwrap()
    }
}

/// Recovers the signer's uncompressed public key bytes `X || Y` (64 bytes,
/// no `0x04` prefix) from a signature over `digest`. Exposed for the
/// Aggregator's single-oracle path, which verifies one signature at a time
/// rather than a whole committee.
pub fn recover_secp256k1_key(digest: &[u8; 32], sig: &RawSignature) -> Option<[u8; 64]> {
    let signature = K256Signature::from_slice(sig.rs()).ok()?;
    let recovery_id = RecoveryId::from_byte(sig.recovery_byte() & 0x01)?;
    let verifying_key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id).ok()?;
    let encoded = verifying_key.to_encoded_point(false);
    let bytes = encoded.as_bytes();
    debug_assert_eq!(bytes.len(), 65);
    debug_assert_eq!(bytes[0], 0x04);
    let mut xy = [0u8; 64];
    xy.copy_from_slice(&bytes[1..65]);
    Some(xy)
}

/// Verifies `sigs[i]` against `candidates[i]` for every index, in order.
/// Matches are returned as the valid-set (oracle ids, preserving order).
/// Mismatches are not fatal: they emit [`Event::SignatureInvalid`] and are
/// dropped from the committee.
pub fn verify_committee(
    digest: &[u8; 32],
    sigs: &[RawSignature],
    candidates: &[OracleDescriptor],
    sink: &mut dyn EventSink,
) -> Vec<ObjectId> {
    let mut valid = Vec::with_capacity(candidates.len());
    for (sig, candidate) in sigs.iter().zip(candidates.iter()) {
        let matched = recover_secp256k1_key(digest, sig)
            .map(|recovered| recovered == candidate.secp256k1_key.0)
            .unwrap_or(false);
        if matched {
            valid.push(candidate.oracle_id);
        } else {
            tracing::warn!(oracle_id = candidate.oracle_id.0, "signature recovery mismatch");
            sink.emit(Event::SignatureInvalid {
                signature: sig.0,
                oracle_id: candidate.oracle_id,
            });
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingEventSink;
    use k256::ecdsa::SigningKey;

    fn sign(key: &SigningKey, digest: &[u8; 32]) -> RawSignature {
        let (sig, recovery_id): (K256Signature, RecoveryId) =
            key.sign_prehash_recoverable(digest).unwrap();
        let mut raw = [0u8; 65];
        raw[..64].copy_from_slice(&sig.to_bytes());
        raw[64] = recovery_id.to_byte();
        RawSignature(raw)
    }

    fn descriptor_for(key: &SigningKey, oracle_id: ObjectId) -> OracleDescriptor {
        let encoded = key.verifying_key().to_encoded_point(false);
        let mut xy = [0u8; 64];
        xy.copy_from_slice(&encoded.as_bytes()[1..65]);
        OracleDescriptor {
            secp256k1_key: Secp256k1Key(xy),
            oracle_id,
        }
    }

    #[test]
    fn valid_signature_recovers_matching_key() {
        let key = SigningKey::from_bytes(&[7u8; 32].into()).unwrap();
        let digest = [42u8; 32];
        let sig = sign(&key, &digest);
        let descriptor = descriptor_for(&key, ObjectId(1));
        let mut sink = RecordingEventSink::default();

        let valid = verify_committee(&digest, &[sig], &[descriptor], &mut sink);
        assert_eq!(valid, vec![ObjectId(1)]);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn mismatched_signature_emits_event_and_is_excluded() {
        let signer = SigningKey::from_bytes(&[7u8; 32].into()).unwrap();
        let other = SigningKey::from_bytes(&[9u8; 32].into()).unwrap();
        let digest = [42u8; 32];
        let sig = sign(&signer, &digest);
        // Descriptor claims a *different* key than the one that actually signed.
        let wrong_descriptor = descriptor_for(&other, ObjectId(5));
        let mut sink = RecordingEventSink::default();

        let valid = verify_committee(&digest, &[sig], &[wrong_descriptor], &mut sink);
        assert!(valid.is_empty());
        assert_eq!(
            sink.events,
            vec![Event::SignatureInvalid {
                signature: sig.0,
                oracle_id: ObjectId(5),
            }]
        );
    }

    #[test]
    fn positional_correspondence_is_respected() {
        let key_a = SigningKey::from_bytes(&[1u8; 32].into()).unwrap();
        let key_b = SigningKey::from_bytes(&[2u8; 32].into()).unwrap();
        let digest = [9u8; 32];
        let sig_a = sign(&key_a, &digest);
        let sig_b = sign(&key_b, &digest);
        let desc_a = descriptor_for(&key_a, ObjectId(1));
        let desc_b = descriptor_for(&key_b, ObjectId(2));
        let mut sink = RecordingEventSink::default();

        let valid = verify_committee(&digest, &[sig_a, sig_b], &[desc_a, desc_b], &mut sink);
        assert_eq!(valid, vec![ObjectId(1), ObjectId(2)]);
    }
}
