//! Fixed-size byte identifiers.
//!
//! The source spec carries these as bare byte blobs; wrapping each shape in
//! its own newtype turns the Signature Verifier's positional-correspondence
//! contract (feed ids never get compared against secp256k1 keys, etc.) into
//! something the compiler enforces rather than something a reviewer has to
//! check by hand.

use core::fmt;

use crate::error::CoreError;

macro_rules! fixed_bytes_id {
    ($name:ident, $len:expr, $wrong_len_err:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
                if bytes.len() != $len {
                    return Err($wrong_len_err);
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(bytes);
                Ok(Self(out))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{})", stringify!($name), hex::encode(self.0))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }
    };
}

fixed_bytes_id!(FeedId, 32, CoreError::WrongFeedHashLength);
fixed_bytes_id!(QueueKey, 32, CoreError::WrongQueueLength);
fixed_bytes_id!(MrEnclave, 32, CoreError::WrongMrEnclaveLength);
fixed_bytes_id!(Slothash, 32, CoreError::WrongSlothashLength);
fixed_bytes_id!(OracleKey, 32, CoreError::WrongOracleIdLength);
fixed_bytes_id!(Secp256k1Key, 64, CoreError::WrongSec256k1KeyLength);

impl Default for Slothash {
    /// Zero-filled: this chain does not populate a slothash in the
    /// update-message digest.
    fn default() -> Self {
        Self([0u8; 32])
    }
}

/// Opaque host-allocated object identity. The core never mints one itself;
/// it always receives it from an `ObjectStore`-style host binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = FeedId::from_slice(&[0u8; 31]).unwrap_err();
        assert_eq!(err, CoreError::WrongFeedHashLength);
        let err = Secp256k1Key::from_slice(&[0u8; 63]).unwrap_err();
        assert_eq!(err, CoreError::WrongSec256k1KeyLength);
    }

    #[test]
    fn debug_hex_prints() {
        let id = FeedId([0xab; 32]);
        let rendered = format!("{id:?}");
        assert!(rendered.starts_with("FeedId(0x"));
    }
}
