//! Assembles the `run_k` transaction instruction client-side, mirroring
//! the discrete `run_1..run_6` dispatch the on-chain program exposes
//! (`oracle_core::submit`). No network I/O happens here — this is pure
//! data assembly, the client-side counterpart of a wallet's "build
//! instruction" step.

use oracle_core::ids::FeedId;
use oracle_core::signature::RawSignature;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::crossbar::SignedQuoteBundle;

pub struct SubmitBuilder {
    pub program_id: Pubkey,
    pub queue: Pubkey,
    pub payer: Pubkey,
}

impl SubmitBuilder {
    pub fn new(program_id: Pubkey, queue: Pubkey, payer: Pubkey) -> Self {
        Self { program_id, queue, payer }
    }

    /// Builds the `run_k` instruction for a committee of `oracles.len()`
    /// members (`1..=6`). Account order is `[payer, queue, oracle_0, ...,
    /// oracle_{k-1}]`; instruction data is the canonical submission
    /// payload the on-chain program decodes back into `submit::run`'s
    /// arguments.
    pub fn run_k(&self, bundle: &SignedQuoteBundle, oracles: &[Pubkey]) -> Result<Instruction, BuildError> {
        if oracles.is_empty() || oracles.len() > 6 {
            return Err(BuildError::InvalidCommitteeArity(oracles.len()));
        }
        if oracles.len() != bundle.signatures.len() {
            return Err(BuildError::MismatchedSignatureCount {
                oracles: oracles.len(),
                signatures: bundle.signatures.len(),
            });
        }

        let mut accounts = Vec::with_capacity(2 + oracles.len());
        accounts.push(AccountMeta::new(self.payer, true));
        accounts.push(AccountMeta::new_readonly(self.queue, false));
        accounts.extend(oracles.iter().map(|o| AccountMeta::new_readonly(*o, false)));

        let data = encode_submission(bundle);

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data,
        })
    }

    /// Builds the `delete_verifier` instruction (spec.md §6): closes
    /// `verifier` and sends its lamports to `recipient`. Account order is
    /// `[recipient, verifier]`, matching `oracle_program::entrypoint`'s
    /// `OP_DELETE_VERIFIER` handler.
    pub fn delete_verifier(&self, recipient: Pubkey, verifier: Pubkey) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![AccountMeta::new(recipient, false), AccountMeta::new(verifier, false)],
            data: vec![1u8],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("committee size {0} is outside the supported 1..=6 range")]
    InvalidCommitteeArity(usize),
    #[error("oracle count {oracles} does not match signature count {signatures}")]
    MismatchedSignatureCount { oracles: usize, signatures: usize },
}

/// `run_k` discriminator || slot le || timestamp_seconds le || feed_count u8
/// || Σ(feed_id || value_le || neg || min_samples) || sig_count u8 || Σ(sig)`.
fn encode_submission(bundle: &SignedQuoteBundle) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(0u8); // run_k discriminator; the program dispatches on accounts.len(), not this byte.
    out.extend_from_slice(&bundle.slot.to_le_bytes());
    out.extend_from_slice(&bundle.timestamp_seconds.to_le_bytes());
    out.push(bundle.feed_ids.len() as u8);
    for i in 0..bundle.feed_ids.len() {
        out.extend_from_slice(bundle.feed_ids[i].as_bytes());
        out.extend_from_slice(&bundle.values[i].to_le_bytes());
        out.push(bundle.values_neg[i] as u8);
        out.push(bundle.min_oracle_samples[i]);
    }
    out.push(bundle.signatures.len() as u8);
    for sig in &bundle.signatures {
        out.extend_from_slice(&sig.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_core::decimal::Decimal;

    fn sample_bundle() -> SignedQuoteBundle {
        SignedQuoteBundle {
            feed_ids: vec![FeedId([1u8; 32])],
            values: vec![Decimal::new(100, false).value()],
            values_neg: vec![false],
            min_oracle_samples: vec![1],
            signatures: vec![RawSignature([0u8; 65])],
            slot: 1,
            timestamp_seconds: 1,
        }
    }

    #[test]
    fn rejects_mismatched_signature_count() {
        let builder = SubmitBuilder::new(Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let bundle = sample_bundle();
        let err = builder
            .run_k(&bundle, &[Pubkey::new_unique(), Pubkey::new_unique()])
            .unwrap_err();
        assert!(matches!(err, BuildError::MismatchedSignatureCount { .. }));
    }

    #[test]
    fn builds_expected_account_layout() {
        let program_id = Pubkey::new_unique();
        let queue = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let oracle = Pubkey::new_unique();
        let builder = SubmitBuilder::new(program_id, queue, payer);
        let bundle = sample_bundle();
        let ix = builder.run_k(&bundle, &[oracle]).unwrap();
        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[0].pubkey, payer);
        assert_eq!(ix.accounts[1].pubkey, queue);
        assert_eq!(ix.accounts[2].pubkey, oracle);
    }

    #[test]
    fn delete_verifier_builds_two_account_instruction() {
        let builder = SubmitBuilder::new(Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let recipient = Pubkey::new_unique();
        let verifier = Pubkey::new_unique();
        let ix = builder.delete_verifier(recipient, verifier);
        assert_eq!(ix.data, vec![1u8]);
        assert_eq!(ix.accounts.len(), 2);
        assert_eq!(ix.accounts[0].pubkey, recipient);
        assert_eq!(ix.accounts[1].pubkey, verifier);
    }
}
