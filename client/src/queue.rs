//! Decodes on-chain Queue accounts and enumerates their oracle set.
//!
//! Grounded on `switchboard-on-demand-client`'s `QueueAccountData`: a
//! `#[repr(C)]`, `bytemuck`-decoded struct with a fixed-capacity oracle-key
//! array plus a length counter, loaded with `get_account_data` and sliced
//! past an 8-byte discriminator.

use anyhow_ext::{anyhow, Error as AnyhowError};
use bytemuck::{Pod, Zeroable};
use oracle_core::ids::ObjectId;
use oracle_core::queue::QueueConfig;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;

use crate::ids::object_id_for;
use crate::oracle::{OracleAccountData, OracleSnapshot};

pub const MAX_QUEUE_ORACLES: usize = 128;

/// On-chain layout for a Queue account. Field order and reserved padding
/// follow the teacher's `QueueAccountData` convention of trailing `_ebufN`
/// slack for forward-compatible account growth.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct QueueAccountData {
    pub authority: Pubkey,
    pub queue_key: [u8; 32],
    pub fee_recipient: Pubkey,
    pub guardian_queue: Pubkey,
    pub oracle_keys: [Pubkey; MAX_QUEUE_ORACLES],
    pub oracle_keys_len: u32,
    pub min_attestations: u32,
    pub oracle_validity_length_ms: u64,
    pub fee: u64,
    pub is_guardian: u8,
    pub has_guardian_queue: u8,
    _padding: [u8; 6],
    pub last_queue_override_ms: u64,
    _ebuf2: [u8; 64],
    _ebuf1: [u8; 256],
}

unsafe impl Pod for QueueAccountData {}
unsafe impl Zeroable for QueueAccountData {}

impl QueueAccountData {
    pub fn size() -> usize {
        8 + std::mem::size_of::<QueueAccountData>()
    }

    pub fn oracle_keys(&self) -> Vec<Pubkey> {
        self.oracle_keys[..self.oracle_keys_len as usize].to_vec()
    }
}

/// Decoded, host-agnostic view of a Queue account, ready to feed into
/// `oracle_core::queue::QueueConfig`.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub id: ObjectId,
    pub pubkey: Pubkey,
    pub authority: ObjectId,
    pub config: QueueConfig,
    pub is_guardian: bool,
    pub oracle_keys: Vec<Pubkey>,
}

pub struct OracleQueueHandle {
    pub pubkey: Pubkey,
}

impl OracleQueueHandle {
    pub fn new(pubkey: Pubkey) -> Self {
        Self { pubkey }
    }

    /// Fetches and decodes the Queue account.
    pub async fn load(&self, client: &RpcClient) -> Result<QueueSnapshot, AnyhowError> {
        tracing::debug!(queue = %self.pubkey, "loading queue account");
        let account = client.get_account_data(&self.pubkey).await?;
        let buf = account
            .get(8..)
            .ok_or_else(|| anyhow!("queue account too short"))?;
        let parsed: &QueueAccountData = bytemuck::try_from_bytes(buf)
            .map_err(|e| anyhow!("failed to parse QueueAccountData: {:?}", e))?;

        Ok(QueueSnapshot {
            id: object_id_for(&self.pubkey),
            pubkey: self.pubkey,
            authority: object_id_for(&parsed.authority),
            config: QueueConfig {
                min_attestations: parsed.min_attestations,
                oracle_validity_length_ms: parsed.oracle_validity_length_ms,
                fee: parsed.fee,
                fee_recipient: object_id_for(&parsed.fee_recipient),
                guardian_queue_id: (parsed.has_guardian_queue != 0)
                    .then(|| object_id_for(&parsed.guardian_queue)),
            },
            is_guardian: parsed.is_guardian != 0,
            oracle_keys: parsed.oracle_keys(),
        })
    }

    /// Enumerates and decodes every oracle registered on this queue.
    pub async fn fetch_oracles(&self, client: &RpcClient) -> Result<Vec<OracleSnapshot>, AnyhowError> {
        let snapshot = self.load(client).await?;
        if snapshot.oracle_keys.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(count = snapshot.oracle_keys.len(), "fetching oracle accounts");
        let accounts = client.get_multiple_accounts(&snapshot.oracle_keys).await?;
        let mut oracles = Vec::with_capacity(accounts.len());
        for (key, account) in snapshot.oracle_keys.iter().zip(accounts.into_iter()) {
            let account = account.ok_or_else(|| anyhow!("missing oracle account {key}"))?;
            let buf = account
                .data
                .get(8..)
                .ok_or_else(|| anyhow!("oracle account too short"))?;
            let parsed: &OracleAccountData = bytemuck::try_from_bytes(buf)
                .map_err(|e| anyhow!("failed to parse OracleAccountData: {:?}", e))?;
            oracles.push(OracleSnapshot::from_account(*key, parsed));
        }
        Ok(oracles)
    }
}
