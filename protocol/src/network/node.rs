//! # Node Orchestrator
//!
//! The top-level runtime entity: owns the confirmed state, its
//! speculative pending twin, the mempool/archive, the known-peer set,
//! and the two channels everything else talks through
//! (`new_synced_blocks` in, `new_pending_txs` out).
//!
//! ## Ownership model
//!
//! The confirmed state is the single source of truth and is mutated only
//! through [`Node::add_block`] — whether the block came from the local
//! miner or from a peer. HTTP handlers and the miner interact through
//! methods that take the internal locks; nothing shares the maps by
//! reference across tasks.
//!
//! ## Mining loop
//!
//! A ticker fires every mining interval. On a tick, if no attempt is in
//! flight and the mempool has work, the node snapshots the mempool into a
//! block template and grinds it on a blocking thread under a *child* of
//! the node's cancellation token. A block arriving on the sync channel
//! cancels the in-flight attempt before any state is committed — peer
//! blocks win the race. Cancelling the node cancels the miner; cancelling
//! the miner does not cancel the node.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{
    DEFAULT_HTTP_PORT, DEFAULT_IP, DEFAULT_MINING_DIFFICULTY, MINING_INTERVAL,
    PENDING_TX_CHANNEL_CAPACITY, SYNCED_BLOCKS_CHANNEL_CAPACITY,
};
use crate::crypto::address::Address;
use crate::crypto::hash::Hash;
use crate::error::ChainError;
use crate::network::mempool::Mempool;
use crate::network::miner::{mine, PendingBlock};
use crate::storage::block::Block;
use crate::storage::log::BlockRecord;
use crate::storage::state::State;
use crate::transaction::types::SignedTx;

// ---------------------------------------------------------------------------
// PeerNode
// ---------------------------------------------------------------------------

/// A peer this node knows about, keyed by its TCP address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerNode {
    pub ip: String,
    pub port: u64,
    pub is_bootstrap: bool,
    /// The account the peer mines to.
    pub account: Address,
}

impl PeerNode {
    pub fn new(ip: impl Into<String>, port: u64, is_bootstrap: bool, account: Address) -> Self {
        Self {
            ip: ip.into(),
            port,
            is_bootstrap,
            account,
        }
    }

    /// `ip:port`, the key under which the peer is tracked.
    pub fn tcp_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

// ---------------------------------------------------------------------------
// NodeConfig
// ---------------------------------------------------------------------------

/// Startup parameters for a [`Node`].
#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub ip: String,
    pub port: u64,
    /// Account credited when this node mines a block.
    pub miner: Address,
    pub bootstrap: Option<PeerNode>,
    pub mining_difficulty: u8,
    /// How often the mining loop polls the mempool. The protocol default
    /// is 10 s; tests shrink it.
    pub mining_interval: Duration,
}

impl NodeConfig {
    pub fn new(data_dir: impl Into<PathBuf>, miner: Address) -> Self {
        Self {
            data_dir: data_dir.into(),
            ip: DEFAULT_IP.to_string(),
            port: u64::from(DEFAULT_HTTP_PORT),
            miner,
            bootstrap: None,
            mining_difficulty: DEFAULT_MINING_DIFFICULTY,
            mining_interval: MINING_INTERVAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Confirmed and pending state, guarded together so readers always see a
/// consistent pair.
struct ChainHandles {
    confirmed: State,
    pending: State,
}

/// The node orchestrator. Construct with [`Node::new`], drive with
/// [`Node::run_mining_loop`], stop with [`Node::shutdown`].
pub struct Node {
    info: PeerNode,
    chain: Mutex<ChainHandles>,
    mempool: Mempool,
    peers: Mutex<HashMap<String, PeerNode>>,

    synced_tx: mpsc::Sender<Block>,
    synced_rx: Mutex<Option<mpsc::Receiver<Block>>>,
    pending_events_tx: mpsc::Sender<SignedTx>,
    pending_events_rx: Mutex<Option<mpsc::Receiver<SignedTx>>>,

    cancel: CancellationToken,
    miner_cancel: Mutex<Option<CancellationToken>>,
    is_mining: AtomicBool,

    mining_interval: Duration,
}

impl Node {
    /// Load the chain from disk and assemble the orchestrator. The
    /// pending state starts as a fresh clone of the confirmed state.
    pub fn new(config: NodeConfig) -> Result<Arc<Self>, ChainError> {
        let confirmed = State::new_from_disk(&config.data_dir, config.mining_difficulty)?;
        let pending = confirmed.pending_copy();

        info!(
            height = confirmed.latest_block().map(|b| b.header.number),
            hash = %confirmed.latest_hash(),
            miner = %config.miner,
            "node state ready"
        );

        let mut peers = HashMap::new();
        if let Some(bootstrap) = config.bootstrap {
            peers.insert(bootstrap.tcp_address(), bootstrap);
        }

        let (synced_tx, synced_rx) = mpsc::channel(SYNCED_BLOCKS_CHANNEL_CAPACITY);
        let (pending_events_tx, pending_events_rx) = mpsc::channel(PENDING_TX_CHANNEL_CAPACITY);

        Ok(Arc::new(Self {
            info: PeerNode::new(config.ip, config.port, false, config.miner),
            chain: Mutex::new(ChainHandles { confirmed, pending }),
            mempool: Mempool::new(),
            peers: Mutex::new(peers),
            synced_tx,
            synced_rx: Mutex::new(Some(synced_rx)),
            pending_events_tx,
            pending_events_rx: Mutex::new(Some(pending_events_rx)),
            cancel: CancellationToken::new(),
            miner_cancel: Mutex::new(None),
            is_mining: AtomicBool::new(false),
            mining_interval: config.mining_interval,
        }))
    }

    // -- Read access ---------------------------------------------------------

    /// This node's own peer descriptor.
    pub fn info(&self) -> &PeerNode {
        &self.info
    }

    /// Data directory the chain lives in.
    pub fn data_dir(&self) -> PathBuf {
        self.chain.lock().confirmed.data_dir().to_path_buf()
    }

    /// Hash of the confirmed tip.
    pub fn latest_hash(&self) -> Hash {
        self.chain.lock().confirmed.latest_hash()
    }

    /// Height of the confirmed tip (0 on an empty chain).
    pub fn latest_number(&self) -> u64 {
        self.chain.lock().confirmed.latest_number()
    }

    /// Consistent snapshot of the tip hash and every balance, taken under
    /// one lock so the pair can never be torn.
    pub fn balances_snapshot(&self) -> (Hash, HashMap<Address, u64>) {
        let chain = self.chain.lock();
        (
            chain.confirmed.latest_hash(),
            chain.confirmed.balances().clone(),
        )
    }

    /// The nonce the account's next transaction must carry, evaluated
    /// against the *pending* state so queued transactions chain.
    pub fn next_account_nonce(&self, account: &Address) -> u64 {
        self.chain.lock().pending.next_account_nonce(account)
    }

    /// Persisted block lookup by height.
    pub fn block_by_height(&self, height: u64) -> Result<BlockRecord, ChainError> {
        self.chain.lock().confirmed.block_by_height(height)
    }

    /// Persisted block lookup by hash.
    pub fn block_by_hash(&self, hash: &Hash) -> Result<BlockRecord, ChainError> {
        self.chain.lock().confirmed.block_by_hash(hash)
    }

    /// Currently pending transactions, in template order.
    pub fn pending_txs(&self) -> Vec<SignedTx> {
        self.mempool.snapshot()
    }

    /// The mempool as a map, for the viewer endpoint.
    pub fn mempool_map(&self) -> HashMap<String, SignedTx> {
        self.mempool.pending_map()
    }

    /// Direct mempool access (tests and adapters).
    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    /// True while a mining attempt is in flight.
    pub fn is_mining(&self) -> bool {
        self.is_mining.load(Ordering::Acquire)
    }

    // -- Peers ---------------------------------------------------------------

    /// Register a peer under its TCP address.
    pub fn add_peer(&self, peer: PeerNode) {
        info!(peer = %peer.tcp_address(), "peer registered");
        self.peers.lock().insert(peer.tcp_address(), peer);
    }

    pub fn remove_peer(&self, peer: &PeerNode) {
        self.peers.lock().remove(&peer.tcp_address());
    }

    /// True for peers already tracked, and always for ourselves.
    pub fn is_known_peer(&self, peer: &PeerNode) -> bool {
        if peer.ip == self.info.ip && peer.port == self.info.port {
            return true;
        }
        self.peers.lock().contains_key(&peer.tcp_address())
    }

    pub fn known_peers(&self) -> HashMap<String, PeerNode> {
        self.peers.lock().clone()
    }

    // -- Channels ------------------------------------------------------------

    /// Sender half of `new_synced_blocks`; the ingress for peer blocks.
    pub fn synced_block_sender(&self) -> mpsc::Sender<Block> {
        self.synced_tx.clone()
    }

    /// Take the `new_pending_txs` receiver. Admitted transactions are
    /// published here for a gossip layer to fan out; if nobody takes the
    /// receiver the node drops the events on the floor.
    pub fn take_pending_tx_receiver(&self) -> Option<mpsc::Receiver<SignedTx>> {
        self.pending_events_rx.lock().take()
    }

    /// The node's root cancellation token (parent of every miner token).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the root token: the mining loop, any in-flight miner, and
    /// anything the embedding binary tied to the token all wind down.
    pub fn shutdown(&self) {
        info!("node shutting down");
        self.cancel.cancel();
    }

    // -- Transaction admission -----------------------------------------------

    /// Admit a signed transaction into the mempool.
    ///
    /// Duplicates (already pending or already mined) succeed silently.
    /// Validation runs against the pending state and *mutates* it — that
    /// is deliberate, so a later transaction from the same sender sees
    /// the effects of earlier queued ones. Failures surface the state
    /// engine's error kinds to the submitter.
    pub fn add_pending_tx(&self, tx: SignedTx, from_peer: &PeerNode) -> Result<(), ChainError> {
        let key = tx.hash()?.hex();

        if self.mempool.contains(&key) {
            return Ok(());
        }

        self.chain.lock().pending.apply_tx(&tx)?;

        info!(
            tx = %key,
            from = %tx.tx.from,
            to = %tx.tx.to,
            value = tx.tx.value,
            peer = %from_peer.tcp_address(),
            "pending tx admitted"
        );

        self.mempool.insert(key, tx.clone());
        if self.pending_events_tx.try_send(tx).is_err() {
            debug!("no consumer on new_pending_txs, event dropped");
        }

        Ok(())
    }

    // -- Block application ---------------------------------------------------

    /// Apply a block to the confirmed state, reset the pending state to a
    /// fresh clone, and archive the block's transactions out of the
    /// mempool. The single entry point for both mined and synced blocks.
    pub fn add_block(&self, block: Block) -> Result<Hash, ChainError> {
        let hash = {
            let mut chain = self.chain.lock();
            let hash = chain.confirmed.apply_block(block.clone())?;
            chain.pending = chain.confirmed.pending_copy();
            hash
        };

        self.mempool.archive_mined(&block);

        info!(
            number = block.header.number,
            hash = %hash,
            txs = block.txs.len(),
            miner = %block.header.miner,
            "block applied"
        );

        Ok(hash)
    }

    /// Handle a block delivered by a peer: cancel any in-flight mining
    /// attempt first, then apply. The losing local attempt, if it
    /// completes anyway, fails the chain rule and is discarded.
    pub fn handle_synced_block(&self, block: Block) {
        if let Some(token) = self.miner_cancel.lock().take() {
            token.cancel();
        }

        match self.add_block(block) {
            Ok(hash) => info!(hash = %hash, "peer block applied"),
            Err(err) if err.is_io() => {
                // The chain head would diverge from disk; stop the node.
                tracing::error!(error = %err, "block-log write failed, shutting down");
                self.shutdown();
            }
            Err(err) => warn!(error = %err, "peer block rejected"),
        }
    }

    // -- Mining --------------------------------------------------------------

    /// Run the mining loop until the node is cancelled. Consumes the
    /// sync-channel receiver; calling this twice is an error.
    pub async fn run_mining_loop(self: Arc<Self>) -> Result<(), ChainError> {
        let mut synced_rx = self
            .synced_rx
            .lock()
            .take()
            .ok_or_else(|| ChainError::Io("mining loop already running".into()))?;

        // The first tick fires one full interval after start, not
        // immediately, so a just-booted node can sync before it mines.
        let mut ticker = interval_at(
            Instant::now() + self.mining_interval,
            self.mining_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.start_mining_attempt();
                }
                maybe_block = synced_rx.recv() => {
                    match maybe_block {
                        Some(block) => self.handle_synced_block(block),
                        None => {
                            debug!("sync channel closed");
                            return Ok(());
                        }
                    }
                }
                _ = self.cancel.cancelled() => {
                    debug!("mining loop cancelled");
                    return Ok(());
                }
            }
        }
    }

    /// Spawn one mining attempt if none is in flight and there is work.
    /// Returns true if an attempt was started.
    pub fn start_mining_attempt(self: &Arc<Self>) -> bool {
        if self.is_mining.load(Ordering::Acquire) || self.mempool.is_empty() {
            return false;
        }

        let token = self.cancel.child_token();
        *self.miner_cancel.lock() = Some(token.clone());
        self.is_mining.store(true, Ordering::Release);

        let node = Arc::clone(self);
        tokio::spawn(async move {
            node.mine_pending_txs(token).await;
            *node.miner_cancel.lock() = None;
            node.is_mining.store(false, Ordering::Release);
        });

        true
    }

    /// One full mining attempt: snapshot the mempool against the current
    /// tip, grind on a blocking thread, and commit the result.
    async fn mine_pending_txs(self: &Arc<Self>, token: CancellationToken) {
        let (template, difficulty) = {
            let chain = self.chain.lock();
            let number = if chain.confirmed.has_genesis_block() {
                chain.confirmed.latest_number() + 1
            } else {
                0
            };
            (
                PendingBlock::new(
                    chain.confirmed.latest_hash(),
                    number,
                    self.info.account,
                    self.mempool.snapshot(),
                ),
                chain.confirmed.mining_difficulty(),
            )
        };

        let mined = tokio::task::spawn_blocking(move || mine(&token, template, difficulty)).await;

        match mined {
            Ok(Ok(block)) => match self.add_block(block) {
                Ok(_) => {}
                Err(err) if err.is_io() => {
                    tracing::error!(error = %err, "block-log write failed, shutting down");
                    self.shutdown();
                }
                Err(err) => {
                    // A peer block landed first; the local result loses.
                    warn!(error = %err, "mined block not committed");
                }
            },
            Ok(Err(ChainError::Canceled)) => {
                debug!("mining attempt cancelled");
            }
            Ok(Err(err)) => {
                warn!(error = %err, "mining attempt failed");
            }
            Err(join_err) => {
                warn!(error = %join_err, "mining task panicked");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;
    use crate::storage::genesis::genesis_path;
    use crate::transaction::signing::sign_tx;
    use crate::transaction::types::Tx;
    use std::fs;

    fn test_node(
        balances: &[(Address, u64)],
        miner: Address,
        difficulty: u8,
    ) -> (tempfile::TempDir, Arc<Node>) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(crate::config::DATABASE_DIR)).unwrap();

        let balance_map: HashMap<String, u64> = balances
            .iter()
            .map(|(addr, bal)| (addr.hex(), *bal))
            .collect();
        let genesis = serde_json::json!({
            "symbol": "CIN",
            "balances": balance_map,
            "fork_tip_1": 0,
        });
        fs::write(genesis_path(dir.path()), genesis.to_string()).unwrap();

        let mut config = NodeConfig::new(dir.path(), miner);
        config.mining_difficulty = difficulty;
        config.mining_interval = Duration::from_millis(100);
        let node = Node::new(config).unwrap();
        (dir, node)
    }

    fn transfer(kp: &Keypair, to: Address, value: u64, nonce: u64) -> SignedTx {
        sign_tx(Tx::with_gas(kp.address(), to, value, nonce, "", 1, 21), kp).unwrap()
    }

    async fn wait_until(mut probe: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if probe() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    // -- Admission -----------------------------------------------------------

    #[tokio::test]
    async fn queued_txs_chain_their_nonces() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let miner = Address::from_bytes([7; 20]);
        let (_dir, node) = test_node(&[(alice.address(), 10_000)], miner, 1);
        let peer = node.info().clone();

        // Three transactions in a row, none mined yet: the pending state
        // carries the nonce forward.
        for nonce in 1..=3 {
            node.add_pending_tx(transfer(&alice, bob, 100, nonce), &peer)
                .unwrap();
        }
        assert_eq!(node.mempool().len(), 3);
        assert_eq!(node.next_account_nonce(&alice.address()), 4);

        // Confirmed state is untouched until a block lands.
        let (_, balances) = node.balances_snapshot();
        assert_eq!(balances[&alice.address()], 10_000);
    }

    #[tokio::test]
    async fn duplicate_submission_is_silent() {
        let alice = Keypair::generate();
        let miner = Address::from_bytes([7; 20]);
        let (_dir, node) = test_node(&[(alice.address(), 10_000)], miner, 1);
        let peer = node.info().clone();

        let tx = transfer(&alice, Address::from_bytes([2; 20]), 100, 1);
        node.add_pending_tx(tx.clone(), &peer).unwrap();
        node.add_pending_tx(tx, &peer).unwrap();
        assert_eq!(node.mempool().len(), 1);
    }

    #[tokio::test]
    async fn bad_txs_surface_their_kind() {
        let alice = Keypair::generate();
        let poor = Keypair::generate();
        let miner = Address::from_bytes([7; 20]);
        let (_dir, node) = test_node(&[(alice.address(), 10_000)], miner, 1);
        let peer = node.info().clone();

        let mut forged = transfer(&alice, Address::from_bytes([2; 20]), 100, 1);
        forged.tx.time += 1;
        assert!(matches!(
            node.add_pending_tx(forged, &peer).unwrap_err(),
            ChainError::Forged
        ));

        let broke = transfer(&poor, Address::from_bytes([2; 20]), 100, 1);
        assert!(matches!(
            node.add_pending_tx(broke, &peer).unwrap_err(),
            ChainError::Insufficient { .. }
        ));

        assert_eq!(node.mempool().len(), 0);
    }

    // -- Block application ---------------------------------------------------

    #[tokio::test]
    async fn add_block_archives_and_resets_pending() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let miner = Address::from_bytes([7; 20]);
        let (_dir, node) = test_node(&[(alice.address(), 10_000)], miner, 1);
        let peer = node.info().clone();

        let tx = transfer(&alice, bob, 100, 1);
        let key = tx.hash().unwrap().hex();
        node.add_pending_tx(tx.clone(), &peer).unwrap();

        let block = Block::new(Hash::empty(), 0, 0, 0, miner, vec![tx]);
        node.add_block(block).unwrap();

        assert_eq!(node.latest_number(), 0);
        assert_eq!(node.mempool().len(), 0);
        assert!(node.mempool().contains(&key), "archived, not forgotten");

        // Pending was re-cloned from confirmed: next nonce is 2.
        assert_eq!(node.next_account_nonce(&alice.address()), 2);
        let (_, balances) = node.balances_snapshot();
        assert_eq!(balances[&bob], 100);
    }

    // -- Mining & sync race --------------------------------------------------

    #[tokio::test]
    async fn synced_block_cancels_inflight_mining() {
        let alice = Keypair::generate();
        let seller = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        // Difficulty 8 keeps the local miner grinding until cancelled.
        let (_dir, node) = test_node(&[(alice.address(), 10_000)], seller.address(), 8);
        let peer = node.info().clone();

        let tx1 = transfer(&alice, bob, 100, 1);
        node.add_pending_tx(tx1.clone(), &peer).unwrap();

        assert!(node.start_mining_attempt());
        assert!(node.is_mining());
        // A second attempt while one is in flight is refused.
        assert!(!node.start_mining_attempt());

        // A peer mined block 0 (genesis, PoW-exempt) with the same tx.
        let peer_block = Block::new(Hash::empty(), 0, 0, 0, seller.address(), vec![tx1.clone()]);
        node.handle_synced_block(peer_block);

        assert_eq!(node.latest_number(), 0);
        assert_eq!(node.mempool().len(), 0);

        // The cancelled miner winds down promptly.
        assert!(
            wait_until(|| !node.is_mining(), Duration::from_secs(5)).await,
            "miner should observe cancellation"
        );
        // The node's root token is untouched.
        assert!(!node.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn mining_loop_mines_the_mempool() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let miner = Address::from_bytes([7; 20]);
        let (_dir, node) = test_node(&[(alice.address(), 10_000)], miner, 1);
        let peer = node.info().clone();

        node.add_pending_tx(transfer(&alice, bob, 100, 1), &peer)
            .unwrap();

        let loop_handle = tokio::spawn(Arc::clone(&node).run_mining_loop());

        assert!(
            wait_until(|| node.latest_number() == 0 && node.mempool().is_empty(),
                Duration::from_secs(10))
            .await,
            "block 0 should be mined from the mempool"
        );

        let record = node.block_by_height(0).unwrap();
        assert_eq!(record.block.header.miner, miner);
        assert_eq!(record.block.txs.len(), 1);

        node.shutdown();
        loop_handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn synced_block_applies_and_remaining_tx_mines_next() {
        let alice = Keypair::generate();
        let seller = Keypair::generate();
        let local_miner = Address::from_bytes([7; 20]);
        let bob = Address::from_bytes([2; 20]);
        let (_dir, node) = test_node(&[(alice.address(), 10_000)], local_miner, 1);
        let peer = node.info().clone();

        let tx1 = transfer(&alice, bob, 100, 1);
        let tx2 = transfer(&alice, bob, 50, 2);
        node.add_pending_tx(tx1.clone(), &peer).unwrap();
        node.add_pending_tx(tx2.clone(), &peer).unwrap();

        let sender = node.synced_block_sender();
        let loop_handle = tokio::spawn(Arc::clone(&node).run_mining_loop());

        // The peer delivers block 0 with tx1 before our first tick.
        let peer_block = Block::new(Hash::empty(), 0, 0, 0, seller.address(), vec![tx1.clone()]);
        sender.send(peer_block).await.unwrap();

        assert!(
            wait_until(|| node.latest_number() == 1, Duration::from_secs(10)).await,
            "tx2 should be mined into block 1"
        );

        let block0 = node.block_by_height(0).unwrap().block;
        assert_eq!(block0.header.miner, seller.address());

        let block1 = node.block_by_height(1).unwrap().block;
        assert_eq!(block1.header.miner, local_miner);
        assert_eq!(block1.txs.len(), 1);
        assert_eq!(block1.txs[0].hash().unwrap(), tx2.hash().unwrap());

        let (_, balances) = node.balances_snapshot();
        // The peer's miner earned block 0's reward + tx1's gas fee.
        assert_eq!(
            balances[&seller.address()],
            crate::config::BLOCK_REWARD + 21
        );
        assert_eq!(balances[&bob], 150);

        node.shutdown();
        loop_handle.await.unwrap().unwrap();
    }
}
