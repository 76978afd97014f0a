//! # Proof-of-Work Miner
//!
//! Grinds the 32-bit header nonce from 0 upward until the block hash
//! satisfies the difficulty predicate, checking the cancellation token on
//! every attempt. CPU-bound by design — the node runs it on a blocking
//! thread and cancels it the moment a peer block arrives.
//!
//! The contract: [`mine`] returns either a fully valid block or
//! [`ChainError::Canceled`]. It never returns a partial result after
//! cancellation.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::crypto::address::Address;
use crate::crypto::hash::Hash;
use crate::error::ChainError;
use crate::storage::block::{is_block_hash_valid, Block};
use crate::transaction::types::{unix_now, SignedTx};

// ---------------------------------------------------------------------------
// PendingBlock
// ---------------------------------------------------------------------------

/// A block template: everything except the winning nonce.
#[derive(Clone, Debug)]
pub struct PendingBlock {
    pub parent: Hash,
    pub number: u64,
    pub miner: Address,
    pub time: u64,
    pub txs: Vec<SignedTx>,
}

impl PendingBlock {
    /// Assemble a template for the next block, stamped with the current
    /// time.
    pub fn new(parent: Hash, number: u64, miner: Address, txs: Vec<SignedTx>) -> Self {
        Self {
            parent,
            number,
            miner,
            time: unix_now(),
            txs,
        }
    }

    fn with_nonce(&self, nonce: u32) -> Block {
        Block::new(
            self.parent,
            self.number,
            nonce,
            self.time,
            self.miner,
            self.txs.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// Mining
// ---------------------------------------------------------------------------

/// Search for a nonce whose block hash satisfies `difficulty`.
///
/// Cancellation is observed between nonce attempts; a fired token yields
/// [`ChainError::Canceled`] promptly. Progress is logged once per elapsed
/// second — observable, not semantically required.
pub fn mine(
    cancel: &CancellationToken,
    pending: PendingBlock,
    difficulty: u8,
) -> Result<Block, ChainError> {
    let started = Instant::now();
    let mut next_progress_log = 1u64;

    info!(
        number = pending.number,
        txs = pending.txs.len(),
        difficulty,
        "mining started"
    );

    for nonce in 0u32..=u32::MAX {
        if cancel.is_cancelled() {
            debug!(number = pending.number, attempts = nonce, "mining cancelled");
            return Err(ChainError::Canceled);
        }

        let block = pending.with_nonce(nonce);
        let hash = block.hash()?;

        if is_block_hash_valid(&hash, difficulty) {
            info!(
                number = pending.number,
                hash = %hash,
                attempts = nonce as u64 + 1,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "block mined"
            );
            return Ok(block);
        }

        let elapsed = started.elapsed().as_secs();
        if elapsed >= next_progress_log {
            debug!(
                number = pending.number,
                attempts = nonce as u64 + 1,
                elapsed_s = elapsed,
                "still mining"
            );
            next_progress_log = elapsed + 1;
        }
    }

    // 2^32 nonces exhausted without a hit; the caller retries with a
    // fresh template (new timestamp) on the next tick.
    Err(ChainError::BadChain(format!(
        "nonce space exhausted for block {}",
        pending.number
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
