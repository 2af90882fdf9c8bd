//! Structural (fatal) error codes.
//!
//! Every variant here corresponds to one of the stable byte-string error
//! identifiers a consumer program is expected to match on. Evidentiary
//! failures (bad signature, future-dated quote, under-subscribed feed) are
//! never represented here — they surface as events or are dropped silently,
//! per the admission policy.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("EWrongFeedHashLength")]
    WrongFeedHashLength,
    #[error("EWrongOracleIdLength")]
    WrongOracleIdLength,
    #[error("EWrongSlothashLength")]
    WrongSlothashLength,
    #[error("EWrongQueueLength")]
    WrongQueueLength,
    #[error("EWrongMrEnclaveLength")]
    WrongMrEnclaveLength,
    #[error("EWrongSec256k1KeyLength")]
    WrongSec256k1KeyLength,
    #[error("EQueueMismatch")]
    QueueMismatch,
    #[error("EOracleInvalid")]
    OracleInvalid,
    #[error("EInvalidLength")]
    InvalidLength,
    #[error("EInvalidQueue")]
    InvalidQueue,
    #[error("EQuoteNotFound")]
    QuoteNotFound,
    #[error("EInvalidAuthority")]
    InvalidAuthority,
    #[error("EInvalidMinAttestations")]
    InvalidMinAttestations,
    #[error("EInvalidOracleValidityLength")]
    InvalidOracleValidityLength,
    #[error("EInvalidCommitteeArity")]
    InvalidCommitteeArity,
    #[error("EFeeType")]
    FeeType,
}

impl CoreError {
    /// The stable wire identifier, for consumers that match on bytes rather
    /// than on the Rust enum (e.g. cross-language event logs).
    pub const fn code(self) -> &'static str {
        match self {
            Self::WrongFeedHashLength => "EWrongFeedHashLength",
            Self::WrongOracleIdLength => "EWrongOracleIdLength",
            Self::WrongSlothashLength => "EWrongSlothashLength",
            Self::WrongQueueLength => "EWrongQueueLength",
            Self::WrongMrEnclaveLength => "EWrongMrEnclaveLength",
            Self::WrongSec256k1KeyLength => "EWrongSec256k1KeyLength",
            Self::QueueMismatch => "EQueueMismatch",
            Self::OracleInvalid => "EOracleInvalid",
            Self::InvalidLength => "EInvalidLength",
            Self::InvalidQueue => "EInvalidQueue",
            Self::QuoteNotFound => "EQuoteNotFound",
            Self::InvalidAuthority => "EInvalidAuthority",
            Self::InvalidMinAttestations => "EInvalidMinAttestations",
            Self::InvalidOracleValidityLength => "EInvalidOracleValidityLength",
            Self::InvalidCommitteeArity => "EInvalidCommitteeArity",
            Self::FeeType => "EFeeType",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
