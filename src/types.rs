/*!
Core types for ArcBridge operations

Chain identifiers and the 32-byte account address with its checksummed
base32 text form shared by both supported chains.
*/

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chain-native numeric asset identifier
pub type AssetId = u64;

/// Supported ledgers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    /// Source chain; deposits are watched here
    Algorand,
    /// Destination chain; representations are minted here
    Voi,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::Algorand => write!(f, "Algorand"),
            Chain::Voi => write!(f, "Voi"),
        }
    }
}

/// Address decode failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Address is not valid base32")]
    InvalidEncoding,

    #[error("Address checksum mismatch")]
    BadChecksum,
}

/// Length of the text form: base32 of 32 key bytes + 4 checksum bytes
const ENCODED_LEN: usize = 58;
const CHECKSUM_LEN: usize = 4;

/// 32-byte account address
///
/// The text form is RFC4648 base32 (no padding) over the public key followed
/// by the last four bytes of its SHA-512/256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address, used as the "does not exist" owner sentinel
    pub const ZERO: Address = Address([0u8; 32]);

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn checksum(key: &[u8; 32]) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(key);
        let mut chk = [0u8; CHECKSUM_LEN];
        chk.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        chk
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ENCODED_LEN {
            return Err(AddressError::InvalidLength {
                expected: ENCODED_LEN,
                actual: s.len(),
            });
        }
        let raw = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|_| AddressError::InvalidEncoding)?;
        if raw.len() != 32 + CHECKSUM_LEN {
            return Err(AddressError::InvalidEncoding);
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&raw[..32]);
        if raw[32..] != Self::checksum(&key) {
            return Err(AddressError::BadChecksum);
        }
        Ok(Address(key))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = [0u8; 32 + CHECKSUM_LEN];
        raw[..32].copy_from_slice(&self.0);
        raw[32..].copy_from_slice(&Self::checksum(&self.0));
        write!(f, "{}", BASE32_NOPAD.encode(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_round_trip() {
        let addr = Address([2u8; 32]);
        let encoded = addr.to_string();
        assert_eq!(encoded.len(), ENCODED_LEN);
        assert_eq!(
            encoded,
            "AIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBMXPWWNQ"
        );
        assert_eq!(encoded.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_bad_checksum() {
        let err = "AIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBMXPWWNA"
            .parse::<Address>()
            .unwrap_err();
        assert_eq!(err, AddressError::BadChecksum);
    }

    #[test]
    fn test_address_wrong_length() {
        let err = "SHORT".parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressError::InvalidLength { actual: 5, .. }));
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.0.iter().all(|&b| b == 0));
        let round = Address::ZERO.to_string().parse::<Address>().unwrap();
        assert_eq!(round, Address::ZERO);
    }

    #[test]
    fn test_chain_display() {
        assert_eq!(Chain::Algorand.to_string(), "Algorand");
        assert_eq!(Chain::Voi.to_string(), "Voi");
    }
}
