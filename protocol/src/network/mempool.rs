//! Pending-transaction pool with a mined-transaction archive.
//!
//! Two maps behind one lock, both keyed by the transaction's content hash
//! in hex: `pending` holds admitted-but-unmined transactions, `archived`
//! holds everything ever mined. A submission whose hash appears in either
//! map is silently absorbed — deduplication is success, not an error,
//! because gossip redelivers constantly.
//!
//! Admission *validation* is not this module's job: the node validates
//! against its pending state before inserting here. The pool only tracks
//! membership and hands the miner applicable snapshots.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::storage::block::Block;
use crate::transaction::types::SignedTx;

/// The node's transaction pool and archive.
pub struct Mempool {
    inner: Mutex<Inner>,
}

struct Inner {
    pending: HashMap<String, SignedTx>,
    archived: HashMap<String, SignedTx>,
}

impl Mempool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending: HashMap::new(),
                archived: HashMap::new(),
            }),
        }
    }

    /// True if the hash is already pending or archived.
    pub fn contains(&self, tx_hash_hex: &str) -> bool {
        let inner = self.inner.lock();
        inner.pending.contains_key(tx_hash_hex) || inner.archived.contains_key(tx_hash_hex)
    }

    /// Insert a validated transaction under its hash.
    pub fn insert(&self, tx_hash_hex: String, tx: SignedTx) {
        self.inner.lock().pending.insert(tx_hash_hex, tx);
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// True when nothing is waiting to be mined.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().pending.is_empty()
    }

    /// Snapshot the pending set for a block template.
    ///
    /// Map iteration order is arbitrary, so the snapshot sorts by
    /// `(sender, nonce)`: per-sender nonce runs stay contiguous and
    /// ascending, which makes every snapshot applicable in order no
    /// matter how it was submitted.
    pub fn snapshot(&self) -> Vec<SignedTx> {
        let inner = self.inner.lock();
        let mut txs: Vec<SignedTx> = inner.pending.values().cloned().collect();
        txs.sort_by(|a, b| (a.tx.from, a.tx.nonce).cmp(&(b.tx.from, b.tx.nonce)));
        txs
    }

    /// A clone of the pending map, for the mempool viewer endpoint.
    pub fn pending_map(&self) -> HashMap<String, SignedTx> {
        self.inner.lock().pending.clone()
    }

    /// Move every transaction mined in `block` from pending to archived.
    /// Transactions this node never saw are archived too, so they can
    /// never be re-admitted later.
    pub fn archive_mined(&self, block: &Block) {
        let mut inner = self.inner.lock();
        for tx in &block.txs {
            let Ok(hash) = tx.hash() else { continue };
            let key = hash.hex();
            inner.pending.remove(&key);
            inner.archived.insert(key, tx.clone());
        }
    }

    /// Drop the archive. Exists for tests that simulate a restarted node
    /// which only remembers what the chain remembers.
    pub fn clear_archive(&self) {
        self.inner.lock().archived.clear();
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
