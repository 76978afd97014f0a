//! # Block Structure & Proof-of-Work Predicate
//!
//! A block is a header plus an ordered list of signed transactions. The
//! block hash is SHA-256 over the block's canonical JSON — header and
//! payload together — so the PoW nonce in the header salts the entire
//! block content.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  BlockHeader                             │
//! │  ├── parent: Hash   (empty at genesis)   │
//! │  ├── number: u64                         │
//! │  ├── nonce: u32     (PoW nonce)          │
//! │  ├── time: u64      (unix seconds)       │
//! │  └── miner: Address                      │
//! ├──────────────────────────────────────────┤
//! │  txs: Vec<SignedTx>                      │
//! └──────────────────────────────────────────┘
//! ```
//!
//! The PoW nonce is a 32-bit header field and has nothing to do with the
//! per-account transaction nonce.

use serde::{Deserialize, Serialize};

use crate::crypto::address::Address;
use crate::crypto::hash::{hash_of, Hash};
use crate::error::ChainError;
use crate::transaction::types::SignedTx;

// ---------------------------------------------------------------------------
// BlockHeader
// ---------------------------------------------------------------------------

/// Chain linkage and mining metadata. Field order is consensus-critical
/// (the block hash covers the canonical JSON encoding).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hash of the parent block; the empty hash at genesis.
    pub parent: Hash,
    /// Block height, 0-indexed.
    pub number: u64,
    /// Proof-of-work nonce, varied by the miner until the block hash
    /// satisfies the difficulty predicate.
    pub nonce: u32,
    /// Unix timestamp (seconds) when the block template was assembled.
    pub time: u64,
    /// Account credited with the block reward and fees.
    pub miner: Address,
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A full block: header plus ordered transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<SignedTx>,
}

impl Block {
    /// Assemble a block from its parts.
    pub fn new(
        parent: Hash,
        number: u64,
        nonce: u32,
        time: u64,
        miner: Address,
        txs: Vec<SignedTx>,
    ) -> Self {
        Self {
            header: BlockHeader {
                parent,
                number,
                nonce,
                time,
                miner,
            },
            txs,
        }
    }

    /// SHA-256 of this block's canonical JSON encoding.
    pub fn hash(&self) -> Result<Hash, ChainError> {
        hash_of(self)
    }

    /// Sum of `gas * gas_price` across the block's transactions — the fee
    /// portion credited to the miner once TIP1 is active.
    pub fn gas_reward(&self) -> u64 {
        self.txs.iter().map(|tx| tx.tx.gas_cost()).sum()
    }
}

// ---------------------------------------------------------------------------
// PoW Predicate
// ---------------------------------------------------------------------------

/// The proof-of-work predicate: the first `difficulty` bytes of the hash
/// must be zero AND the byte immediately after the zero run must be
/// non-zero.
///
/// The strict non-zero requirement is intentional: a hash with *more*
/// leading zeros than asked for does not satisfy difficulty `k`. This
/// shrinks the effective target space slightly but keeps the predicate
/// an exact difficulty class rather than a threshold.
pub fn is_block_hash_valid(hash: &Hash, difficulty: u8) -> bool {
    let k = difficulty as usize;
    if k >= hash.0.len() {
        return false;
    }
    hash.0[..k].iter().all(|b| *b == 0) && hash.0[k] != 0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
