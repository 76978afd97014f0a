//! Canonical account address type.
//!
//! An address is exactly 20 bytes, derived from a secp256k1 public key as
//! the last 20 bytes of `Keccak256(uncompressed_pubkey[1..])`. Textual
//! form is `0x` + 40 lowercase hex characters; equality is bytewise.
//! Internally and on disk the raw bytes are canonical — hex only appears
//! at serialization boundaries.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;

/// Failure to parse an address from its textual form.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address hex is invalid: {0}")]
    BadHex(String),

    #[error("address must be {ADDRESS_LENGTH} bytes, got {0}")]
    BadLength(usize),
}

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// Construct from the canonical 20-byte form.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    /// The all-zero address (burn target, default miner).
    pub fn zero() -> Self {
        Address([0u8; ADDRESS_LENGTH])
    }

    /// True iff every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Textual form: `0x` + lowercase hex.
    pub fn hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
        let bytes = hex::decode(stripped).map_err(|e| AddressError::BadHex(e.to_string()))?;
        let len = bytes.len();
        let arr: [u8; ADDRESS_LENGTH] =
            bytes.try_into().map_err(|_| AddressError::BadLength(len))?;
        Ok(Address(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_roundtrip() {
        let text = "0x23ba76a8aeb6080115c4e71bb598ab5094432d8c";
        let addr: Address = text.parse().unwrap();
        assert_eq!(addr.hex(), text);
    }

    #[test]
    fn display_is_lowercase() {
        // Mixed-case input normalizes on output.
        let addr: Address = "0x23BA76A8AEB6080115C4E71BB598AB5094432D8C".parse().unwrap();
        assert_eq!(addr.hex(), "0x23ba76a8aeb6080115c4e71bb598ab5094432d8c");
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = "23ba76a8aeb6080115c4e71bb598ab5094432d8c"
            .parse::<Address>()
            .unwrap_err();
        assert!(matches!(err, AddressError::MissingPrefix));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "0xabcd".parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressError::BadLength(2)));
    }

    #[test]
    fn zero_address() {
        let zero: Address = crate::config::DEFAULT_MINER.parse().unwrap();
        assert!(zero.is_zero());
        assert_eq!(zero, Address::zero());
    }

    #[test]
    fn serde_roundtrip_as_json_key_material() {
        let addr: Address = "0x6fdc0d8d15ae6b4ebf45c52fd2aafbcbb19a65c8".parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
