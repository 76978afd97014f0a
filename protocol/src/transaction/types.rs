//! Transaction types and cost accounting.
//!
//! Field order is consensus-critical: hashes and signatures are computed
//! over the canonical JSON encoding, which serializes struct fields in
//! the order declared here. Reordering fields is a hard fork.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{REWARD_DATA, TX_FEE};
use crate::crypto::address::Address;
use crate::crypto::hash::{hash_of, Hash};
use crate::crypto::keys::{recover_address, Signature};
use crate::error::ChainError;

// ---------------------------------------------------------------------------
// Tx
// ---------------------------------------------------------------------------

/// An unsigned value transfer.
///
/// `time` is stamped at construction, is part of the signed payload, and
/// acts as the anti-replay salt: re-issuing the same transfer produces a
/// different content hash. `nonce` is the per-sender sequence number;
/// the first valid value is 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub from: Address,
    pub to: Address,
    pub value: u64,
    pub nonce: u64,
    /// Free-form tag. The value "reward" is reserved — see
    /// [`Tx::is_reward`].
    pub data: String,
    /// Seconds since the Unix epoch, stamped at construction.
    pub time: u64,
    pub gas: u64,
    pub gas_price: u64,
}

impl Tx {
    /// Legacy constructor: stamps `time = now` and zeroes the gas fields.
    /// Fees for these transactions are the flat [`TX_FEE`] pre-fork.
    pub fn new(from: Address, to: Address, value: u64, nonce: u64, data: impl Into<String>) -> Self {
        Self::with_gas(from, to, value, nonce, data, 0, 0)
    }

    /// Full constructor with explicit gas parameters.
    pub fn with_gas(
        from: Address,
        to: Address,
        value: u64,
        nonce: u64,
        data: impl Into<String>,
        gas: u64,
        gas_price: u64,
    ) -> Self {
        Self {
            from,
            to,
            value,
            nonce,
            data: data.into(),
            time: unix_now(),
            gas,
            gas_price,
        }
    }

    /// Total amount debited from the sender: the transferred value plus
    /// the fee. Pre-fork the fee is the flat [`TX_FEE`]; once TIP1 is
    /// active it is `gas * gas_price`.
    pub fn cost(&self, is_tip1: bool) -> u64 {
        if is_tip1 {
            self.value + self.gas_cost()
        } else {
            self.value + TX_FEE
        }
    }

    /// The gas portion of the fee, `gas * gas_price`.
    pub fn gas_cost(&self) -> u64 {
        self.gas * self.gas_price
    }

    /// True iff this transaction carries the reserved reward tag.
    pub fn is_reward(&self) -> bool {
        self.data == REWARD_DATA
    }

    /// The canonical encoding the signature covers.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ChainError> {
        Ok(serde_json::to_vec(self)?)
    }
}

// ---------------------------------------------------------------------------
// SignedTx
// ---------------------------------------------------------------------------

/// An unsigned transaction plus its 65-byte recoverable signature.
///
/// The JSON form flattens the transaction fields and appends `sig`, so a
/// signed transaction reads as one flat object on the wire and in the
/// block log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    #[serde(flatten)]
    pub tx: Tx,
    pub sig: Signature,
}

impl SignedTx {
    /// Content hash: SHA-256 of this signed transaction's JSON. Used as
    /// the mempool and archive key.
    pub fn hash(&self) -> Result<Hash, ChainError> {
        hash_of(self)
    }

    /// Verify that the signature recovers to `from` over the canonical
    /// encoding of the unsigned transaction.
    ///
    /// Returns false if any signed field — including `time` — was altered
    /// after signing, or if the signature is malformed.
    pub fn is_authentic(&self) -> bool {
        let encoded = match self.tx.canonical_bytes() {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        match recover_address(&encoded, &self.sig) {
            Ok(addr) => addr == self.tx.from,
            Err(_) => false,
        }
    }
}

/// Current time as seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the Unix epoch")
        .as_secs()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
