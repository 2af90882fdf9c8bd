//! Instruction dispatch: decodes the wire payload `oracle-client` assembles
//! (see `oracle_client::submit::encode_submission`) and calls straight into
//! `oracle_core::submit::run`. This file owns no verification logic — it
//! only decodes accounts/instruction bytes and reports the result back as a
//! `ProgramResult`.

use oracle_core::error::CoreError;
use oracle_core::ids::FeedId;
use oracle_core::signature::RawSignature;
use pinocchio::account_info::AccountInfo;
use pinocchio::program_error::ProgramError;
use pinocchio::pubkey::Pubkey;
use pinocchio::{default_allocator, default_panic_handler, program_entrypoint, ProgramResult};
use pinocchio_log::log;

use crate::host::{SolanaClock, SolanaEventSink, SolanaObjectStore};
use crate::storage::{
    reconstruct_oracle, reconstruct_queue, reconstruct_quote_verifier, StoredOracle, StoredQueue, StoredQuoteVerifier,
};

program_entrypoint!(process_instruction);
default_allocator!();
default_panic_handler!();

/// Opcode byte at the front of every instruction's data.
const OP_RUN_K: u8 = 0;
const OP_DELETE_VERIFIER: u8 = 1;

#[inline(never)]
fn process_instruction(
    _program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let (&opcode, rest) = instruction_data
        .split_first()
        .ok_or(ProgramError::InvalidInstructionData)?;

    match opcode {
        OP_RUN_K => process_run_k(accounts, rest),
        OP_DELETE_VERIFIER => process_delete_verifier(accounts),
        _ => Err(ProgramError::InvalidInstructionData),
    }
}

/// `accounts = [payer, queue, oracle_0 .. oracle_{k-1}]`, `k` in `1..=6`.
/// `data = slot_le(8) || timestamp_le(8) || feed_count(1) ||
///         feed_count * (feed_id(32) || value_le(16) || neg(1) || min_samples(1)) ||
///         sig_count(1) || sig_count * sig(65)`.
fn process_run_k(accounts: &[AccountInfo], data: &[u8]) -> ProgramResult {
    let [_payer, queue_account, oracle_accounts @ ..] = accounts else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };
    if oracle_accounts.is_empty() || oracle_accounts.len() > 6 {
        return Err(CoreError::InvalidCommitteeArity.into());
    }

    let mut cursor = data;
    let slot = take_u64_le(&mut cursor)?;
    let timestamp_seconds = take_u64_le(&mut cursor)?;
    let feed_count = take_u8(&mut cursor)? as usize;

    let mut feed_ids = Vec::with_capacity(feed_count);
    let mut values = Vec::with_capacity(feed_count);
    let mut values_neg = Vec::with_capacity(feed_count);
    let mut min_oracle_samples = Vec::with_capacity(feed_count);
    for _ in 0..feed_count {
        feed_ids.push(FeedId(take_array::<32>(&mut cursor)?));
        values.push(u128::from_le_bytes(take_array::<16>(&mut cursor)?));
        values_neg.push(take_u8(&mut cursor)? != 0);
        min_oracle_samples.push(take_u8(&mut cursor)?);
    }

    let sig_count = take_u8(&mut cursor)? as usize;
    if sig_count != oracle_accounts.len() {
        return Err(CoreError::InvalidLength.into());
    }
    let mut signatures = Vec::with_capacity(sig_count);
    for _ in 0..sig_count {
        signatures.push(RawSignature(take_array::<65>(&mut cursor)?));
    }

    let queue_data = queue_account.try_borrow_data().map_err(|_| ProgramError::AccountBorrowFailed)?;
    let stored_queue: &StoredQueue = bytemuck_ref(&queue_data)?;
    let queue = reconstruct_queue(queue_account.key(), stored_queue);

    let mut oracle_storage = Vec::with_capacity(oracle_accounts.len());
    for account in oracle_accounts {
        let data = account.try_borrow_data().map_err(|_| ProgramError::AccountBorrowFailed)?;
        let stored: &StoredOracle = bytemuck_ref(&data)?;
        oracle_storage.push(reconstruct_oracle(account.key(), stored));
    }
    let oracle_refs: Vec<&_> = oracle_storage.iter().collect();

    let clock = SolanaClock::load()?;
    let mut sink = SolanaEventSink;

    let result = oracle_core::submit::run(
        &feed_ids,
        &values,
        &values_neg,
        &min_oracle_samples,
        &signatures,
        slot,
        timestamp_seconds,
        &oracle_refs,
        &queue,
        &clock,
        &mut sink,
    )?;

    log!("run_k: {} quotes admitted", result.quotes.len());
    Ok(())
}

/// `accounts = [recipient, verifier_account]`. Closes `verifier_account` and
/// sends its lamports to `recipient`, the only teardown path spec.md §6's
/// `delete_verifier` requires.
fn process_delete_verifier(accounts: &[AccountInfo]) -> ProgramResult {
    let [recipient, verifier_account] = accounts else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };

    let stored_queue = {
        let data = verifier_account.try_borrow_data().map_err(|_| ProgramError::AccountBorrowFailed)?;
        let stored: &StoredQuoteVerifier = bytemuck_ref(&data)?;
        *stored
    };
    let verifier = reconstruct_quote_verifier(verifier_account.key(), &stored_queue);

    let mut store = SolanaObjectStore {
        closing_account: verifier_account,
        recipient,
    };
    verifier.delete_verifier(&mut store)?;

    log!("quote verifier closed");
    Ok(())
}

fn bytemuck_ref<T: bytemuck::Pod>(bytes: &[u8]) -> Result<&T, ProgramError> {
    let bytes = bytes.get(8..).ok_or(ProgramError::AccountDataTooSmall)?;
    bytemuck::try_from_bytes(bytes).map_err(|_| ProgramError::InvalidAccountData)
}

fn take_u64_le(cursor: &mut &[u8]) -> Result<u64, ProgramError> {
    Ok(u64::from_le_bytes(take_array::<8>(cursor)?))
}

fn take_u8(cursor: &mut &[u8]) -> Result<u8, ProgramError> {
    let (&byte, rest) = cursor.split_first().ok_or(ProgramError::InvalidInstructionData)?;
    *cursor = rest;
    Ok(byte)
}

fn take_array<const N: usize>(cursor: &mut &[u8]) -> Result<[u8; N], ProgramError> {
    if cursor.len() < N {
        return Err(ProgramError::InvalidInstructionData);
    }
    let (head, tail) = cursor.split_at(N);
    *cursor = tail;
    Ok(head.try_into().unwrap())
}

impl From<CoreError> for ProgramError {
    fn from(_: CoreError) -> Self {
        // Every `CoreError` is a structural, fatal admission failure; the
        // specific code is still visible in program logs via `Display`.
        ProgramError::Custom(1)
    }
}
