//! External aggregation-service collaborator (spec.md §1 treats this as
//! out-of-scope): fetches a signed committee quote bundle for a set of
//! feeds from a Crossbar-style gateway.
//!
//! This crate defines the trait and a minimal HTTP stub; it does not
//! implement Crossbar's own aggregation logic.

use oracle_core::ids::{FeedId, ObjectId};
use oracle_core::signature::RawSignature;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum CrossbarError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("gateway returned no committee for the requested feeds")]
    EmptyCommittee,
}

/// A fully-assembled, gateway-signed submission, ready for
/// `oracle_core::submit::run` (or the discrete `run_k`) once paired with
/// the queue's oracle handles.
#[derive(Debug, Clone)]
pub struct SignedQuoteBundle {
    pub feed_ids: Vec<FeedId>,
    pub values: Vec<u128>,
    pub values_neg: Vec<bool>,
    pub min_oracle_samples: Vec<u8>,
    pub signatures: Vec<RawSignature>,
    pub slot: u64,
    pub timestamp_seconds: u64,
}

pub trait CrossbarClient {
    fn fetch_signed_quotes(
        &self,
        feed_ids: &[FeedId],
        queue: ObjectId,
    ) -> Result<SignedQuoteBundle, CrossbarError>;
}

#[derive(Deserialize)]
struct GatewayQuote {
    feed_id: String,
    value: String,
    neg: bool,
    min_oracle_samples: u8,
}

#[derive(Deserialize)]
struct GatewayResponse {
    slot: u64,
    timestamp_seconds: u64,
    quotes: Vec<GatewayQuote>,
    signatures: Vec<String>,
}

/// Blocking HTTP stub: posts the requested feed set to a configured
/// gateway URL and decodes its JSON response into a [`SignedQuoteBundle`].
/// Real deployments point `base_url` at a Crossbar gateway or a
/// self-hosted equivalent speaking the same wire shape.
pub struct HttpCrossbarClient {
    pub base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpCrossbarClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl CrossbarClient for HttpCrossbarClient {
    fn fetch_signed_quotes(
        &self,
        feed_ids: &[FeedId],
        queue: ObjectId,
    ) -> Result<SignedQuoteBundle, CrossbarError> {
        let feed_hex: Vec<String> = feed_ids.iter().map(|f| hex::encode(f.as_bytes())).collect();
        let url = format!("{}/fetch", self.base_url.trim_end_matches('/'));
        let response: GatewayResponse = self
            .client
            .post(url)
            .json(&serde_json::json!({ "feeds": feed_hex, "queue": queue.0 }))
            .send()
            .map_err(|e| CrossbarError::Transport(e.to_string()))?
            .json()
            .map_err(|e| CrossbarError::Decode(e.to_string()))?;

        if response.quotes.is_empty() || response.signatures.is_empty() {
            return Err(CrossbarError::EmptyCommittee);
        }

        let mut feed_ids = Vec::with_capacity(response.quotes.len());
        let mut values = Vec::with_capacity(response.quotes.len());
        let mut values_neg = Vec::with_capacity(response.quotes.len());
        let mut min_oracle_samples = Vec::with_capacity(response.quotes.len());
        for quote in &response.quotes {
            let bytes = hex::decode(&quote.feed_id).map_err(|e| CrossbarError::Decode(e.to_string()))?;
            feed_ids.push(FeedId::from_slice(&bytes).map_err(|e| CrossbarError::Decode(e.to_string()))?);
            values.push(
                quote
                    .value
                    .parse::<u128>()
                    .map_err(|e| CrossbarError::Decode(e.to_string()))?,
            );
            values_neg.push(quote.neg);
            min_oracle_samples.push(quote.min_oracle_samples);
        }

        let mut signatures = Vec::with_capacity(response.signatures.len());
        for sig_hex in &response.signatures {
            let bytes = hex::decode(sig_hex).map_err(|e| CrossbarError::Decode(e.to_string()))?;
            let array: [u8; 65] = bytes
                .try_into()
                .map_err(|_| CrossbarError::Decode("signature must be 65 bytes".into()))?;
            signatures.push(RawSignature(array));
        }

        Ok(SignedQuoteBundle {
            feed_ids,
            values,
            values_neg,
            min_oracle_samples,
            signatures,
            slot: response.slot,
            timestamp_seconds: response.timestamp_seconds,
        })
    }
}
