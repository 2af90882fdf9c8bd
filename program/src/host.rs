//! Implements `oracle-core`'s host traits against pinocchio account infos
//! and sysvars.

use oracle_core::error::CoreError;
use oracle_core::events::Event;
use oracle_core::host::{Clock, EventSink, FeePayer, ObjectStore};
use oracle_core::ids::ObjectId;
use pinocchio::account_info::AccountInfo;
use pinocchio::sysvars::clock::Clock as ClockSysvar;
use pinocchio::sysvars::Sysvar;
use pinocchio_log::log;

/// Reads slot and unix timestamp from the Clock sysvar once per
/// instruction; the core never reads time itself.
pub struct SolanaClock {
    slot: u64,
    now_ms: u64,
}

impl SolanaClock {
    pub fn load() -> Result<Self, CoreError> {
        let clock = ClockSysvar::get().map_err(|_| CoreError::InvalidQueue)?;
        Ok(Self {
            slot: clock.slot,
            now_ms: (clock.unix_timestamp.max(0) as u64).saturating_mul(1000),
        })
    }
}

impl Clock for SolanaClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn slot(&self) -> u64 {
        self.slot
    }
}

/// Logs every event through `pinocchio_log`. There is no event-log account
/// in this binding — consumers that need a durable event history read
/// program logs, matching the teacher program's own `log!`-only reporting.
pub struct SolanaEventSink;

impl EventSink for SolanaEventSink {
    fn emit(&mut self, event: Event) {
        match event {
            Event::QuoteVerified { feed_id, slot, timestamp_ms, queue, .. } => {
                log!(
                    "quote verified: feed={} queue={} slot={} ts_ms={}",
                    hex_prefix(feed_id.as_bytes()),
                    queue.0,
                    slot,
                    timestamp_ms
                );
            }
            Event::SignatureInvalid { oracle_id, .. } => {
                log!("signature invalid: oracle={}", oracle_id.0);
            }
            Event::AggregatorAuthorityUpdated { aggregator, new_authority } => {
                log!("aggregator {} authority -> {}", aggregator.0, new_authority.0);
            }
            Event::QueueAuthorityUpdated { queue, new_authority } => {
                log!("queue {} authority -> {}", queue.0, new_authority.0);
            }
            Event::QueueFeeTypeAdded { queue, coin_type } => {
                log!("queue {} fee type added: {}", queue.0, coin_type.as_str());
            }
            Event::QueueFeeTypeRemoved { queue, coin_type } => {
                log!("queue {} fee type removed: {}", queue.0, coin_type.as_str());
            }
            Event::QueueCreated { queue, authority } => {
                log!("queue {} created, authority={}", queue.0, authority.0);
            }
        }
    }
}

fn hex_prefix(bytes: &[u8; 32]) -> &'static str {
    // pinocchio_log's formatting budget is small; a full 64-char hex id
    // dwarfs a typical log line, so only the first byte is surfaced.
    match bytes[0] {
        0 => "0x00..",
        _ => "0x..",
    }
}

/// Pays fees via a CPI system-program transfer from the payer account to
/// the recipient account. `recipient` here is `ObjectId`-tagged but the
/// actual transfer is keyed by the `AccountInfo`s supplied at call time —
/// the caller is responsible for ensuring those accounts' keys correspond
/// to the `ObjectId`s the queue expects.
pub struct SolanaFeePayer<'a> {
    pub payer: &'a AccountInfo,
    pub recipient: &'a AccountInfo,
}

impl FeePayer for SolanaFeePayer<'_> {
    fn pay(&mut self, _coin_type: &str, amount: u64, _recipient: ObjectId) -> Result<(), CoreError> {
        if amount == 0 {
            return Ok(());
        }
        pinocchio_system::instructions::Transfer {
            from: self.payer,
            to: self.recipient,
            lamports: amount,
        }
        .invoke()
        .map_err(|_| CoreError::FeeType)
    }
}

/// Backs `QuoteVerifier::delete_verifier`: draining an account's lamports
/// to `recipient` and zeroing its data is this chain's only notion of
/// destroying an object. `allocate` is never called from this binding —
/// every account this program reads already exists by the time an
/// instruction runs, created by the system program in the same
/// transaction.
pub struct SolanaObjectStore<'a> {
    pub closing_account: &'a AccountInfo,
    pub recipient: &'a AccountInfo,
}

impl ObjectStore for SolanaObjectStore<'_> {
    fn allocate(&mut self) -> ObjectId {
        unreachable!("oracle-program instructions never mint a fresh ObjectId in-memory")
    }

    fn deallocate(&mut self, _id: ObjectId) -> Result<(), CoreError> {
        let mut closing_lamports = self
            .closing_account
            .try_borrow_mut_lamports()
            .map_err(|_| CoreError::InvalidQueue)?;
        let mut recipient_lamports = self
            .recipient
            .try_borrow_mut_lamports()
            .map_err(|_| CoreError::InvalidQueue)?;
        **recipient_lamports += **closing_lamports;
        **closing_lamports = 0;

        let mut data = self
            .closing_account
            .try_borrow_mut_data()
            .map_err(|_| CoreError::InvalidQueue)?;
        data.fill(0);
        Ok(())
    }
}
