//! # Content Hashing
//!
//! Cinder identifies blocks and transactions by the SHA-256 digest of
//! their canonical JSON encoding. Canonical means: struct fields serialize
//! in declared order, byte arrays serialize as lowercase hex, and no
//! map-based (unordered) types appear anywhere in a hashed object. Under
//! those rules `serde_json` is deterministic, so the same object always
//! produces the same digest on every node.
//!
//! Keccak-256 appears only in address derivation, for compatibility with
//! Ethereum-style accounts.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::fmt;

use crate::config::HASH_LENGTH;
use crate::error::ChainError;

/// Compute the SHA-256 digest of raw bytes.
pub fn sha256(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the Keccak-256 digest of raw bytes. Used for deriving account
/// addresses from public keys; everything else hashes with SHA-256.
pub fn keccak256(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 over the canonical JSON encoding of a value.
///
/// This is the content hash used for blocks and signed transactions.
pub fn hash_of<T: Serialize>(value: &T) -> Result<Hash, ChainError> {
    let encoded = serde_json::to_vec(value)?;
    Ok(Hash(sha256(&encoded)))
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// A 32-byte SHA-256 digest.
///
/// Textual form is 64 lowercase hex characters with no prefix, both in
/// JSON and in `Display`. The all-zero value is the "empty hash" and
/// denotes "no parent" at genesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    /// The all-zero hash, used as the parent of the genesis block.
    pub fn empty() -> Self {
        Hash([0u8; HASH_LENGTH])
    }

    /// True iff every byte is zero.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Lowercase hex, no prefix.
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from lowercase/uppercase hex without prefix.
    pub fn from_hex(s: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(s).map_err(|e| ChainError::Io(format!("bad hash hex: {e}")))?;
        let arr: [u8; HASH_LENGTH] = bytes
            .try_into()
            .map_err(|_| ChainError::Io(format!("hash must be {HASH_LENGTH} bytes")))?;
        Ok(Hash(arr))
    }

    /// Borrow the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
