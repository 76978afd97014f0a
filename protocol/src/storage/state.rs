//! # State Engine
//!
//! The deterministic rules by which signed transactions mutate balances
//! and nonces, and by which blocks extend the chain.
//!
//! A [`State`] is built by replaying the block log over the genesis
//! balances. From then on it mutates only through [`State::apply_block`]
//! (the confirmed state) or [`State::apply_tx`] (the speculative pending
//! copy used for mempool admission).
//!
//! ## Two-phase application
//!
//! `apply_block` never partially mutates: it validates the chain rule,
//! applies every transaction to a scratch copy of the balance/nonce maps,
//! credits the miner, and only then appends the record to disk and swaps
//! the scratch maps in. Any failure leaves both memory and disk untouched.
//!
//! ## Indexes
//!
//! `hash_index` and `height_index` map to byte offsets in the block log.
//! They are derived state: rebuilt from the log on startup, never
//! persisted, and absent from pending copies.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{BLOCK_REWARD, TX_FEE};
use crate::crypto::address::Address;
use crate::crypto::hash::Hash;
use crate::error::ChainError;
use crate::storage::block::{is_block_hash_valid, Block};
use crate::storage::genesis::{block_db_path, init_datadir, load_genesis};
use crate::storage::log::{append_record, record_at, scan_records, BlockRecord};
use crate::transaction::types::SignedTx;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The ledger state at a chain tip.
///
/// The instance produced by [`State::new_from_disk`] is the *confirmed*
/// state: it owns the append handle to the block log and the offset
/// indexes. [`State::pending_copy`] produces the in-memory speculative
/// twin used for admission validation — same rules, no disk, no indexes.
pub struct State {
    data_dir: PathBuf,

    balances: HashMap<Address, u64>,
    account_nonces: HashMap<Address, u64>,

    latest_block: Option<Block>,
    latest_hash: Hash,

    hash_index: HashMap<Hash, u64>,
    height_index: HashMap<u64, u64>,

    /// Append handle to the block log. `None` in pending copies, which
    /// must never write.
    db: Option<File>,

    mining_difficulty: u8,
    fork_tip1: u64,
}

impl State {
    /// Build the confirmed state: initialize the data directory if
    /// needed, seed the genesis balances, then replay every block in the
    /// log, rebuilding the offset indexes along the way.
    pub fn new_from_disk(data_dir: &Path, mining_difficulty: u8) -> Result<Self, ChainError> {
        init_datadir(data_dir)?;
        let genesis = load_genesis(data_dir)?;

        let db = OpenOptions::new()
            .append(true)
            .open(block_db_path(data_dir))?;

        let mut state = Self {
            data_dir: data_dir.to_path_buf(),
            balances: genesis.balances.into_iter().collect(),
            account_nonces: HashMap::new(),
            latest_block: None,
            latest_hash: Hash::empty(),
            hash_index: HashMap::new(),
            height_index: HashMap::new(),
            db: Some(db),
            mining_difficulty,
            fork_tip1: genesis.fork_tip_1,
        };

        let records = scan_records(data_dir)?;
        let replayed = records.len();
        for (offset, record) in records {
            let (staged, hash) = state.validate_and_stage(&record.block)?;
            if hash != record.hash {
                return Err(ChainError::BadChain(format!(
                    "log record at offset {offset} claims hash {} but block hashes to {hash}",
                    record.hash
                )));
            }
            state.commit(record.block, hash, staged, offset);
        }

        info!(
            height = state.latest_block.as_ref().map(|b| b.header.number),
            hash = %state.latest_hash,
            blocks_replayed = replayed,
            "state loaded from disk"
        );

        Ok(state)
    }

    // -- Accessors -----------------------------------------------------------

    /// Balance of an account; absent accounts hold 0.
    pub fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// All non-absent account balances.
    pub fn balances(&self) -> &HashMap<Address, u64> {
        &self.balances
    }

    /// Last nonce the account used; 0 if never seen.
    pub fn account_nonce(&self, account: &Address) -> u64 {
        self.account_nonces.get(account).copied().unwrap_or(0)
    }

    /// The nonce the account's next transaction must carry.
    pub fn next_account_nonce(&self, account: &Address) -> u64 {
        self.account_nonce(account) + 1
    }

    /// The chain tip, if any block has been applied.
    pub fn latest_block(&self) -> Option<&Block> {
        self.latest_block.as_ref()
    }

    /// Hash of the chain tip; the empty hash before genesis.
    pub fn latest_hash(&self) -> Hash {
        self.latest_hash
    }

    /// True once a genesis block has been applied.
    pub fn has_genesis_block(&self) -> bool {
        self.latest_block.is_some()
    }

    /// Height of the tip, or 0 on an empty chain.
    pub fn latest_number(&self) -> u64 {
        self.latest_block
            .as_ref()
            .map(|b| b.header.number)
            .unwrap_or(0)
    }

    /// Difficulty new blocks must satisfy.
    pub fn mining_difficulty(&self) -> u8 {
        self.mining_difficulty
    }

    /// Whether the TIP1 fee fork is active at the current tip. A fork
    /// height of 0 means active from genesis. Cost and reward
    /// computations consult this at the moment a block is applied, not
    /// at program start.
    pub fn is_tip1_fork(&self) -> bool {
        self.latest_number() >= self.fork_tip1
    }

    // -- Transaction application ---------------------------------------------

    /// Validate and apply one signed transaction to this state.
    ///
    /// Checks, in order: authenticity, nonce continuity, the reward-tag
    /// policy, and funds. On success the sender is debited `cost`, the
    /// recipient credited `value`, and the sender's nonce advanced. The
    /// fee portion is credited to the miner at block-application time,
    /// not here.
    pub fn apply_tx(&mut self, tx: &SignedTx) -> Result<(), ChainError> {
        let is_tip1 = self.is_tip1_fork();
        apply_tx_to(&mut self.balances, &mut self.account_nonces, tx, is_tip1)
    }

    // -- Block application ---------------------------------------------------

    /// Validate a block against this state and commit it: apply every
    /// transaction in order on a scratch copy, credit the miner, append
    /// the record to the block log, update the indexes, and advance the
    /// tip. Returns the block's hash.
    pub fn apply_block(&mut self, block: Block) -> Result<Hash, ChainError> {
        let (staged, hash) = self.validate_and_stage(&block)?;

        let record = BlockRecord {
            hash,
            block: block.clone(),
        };
        let db = self
            .db
            .as_mut()
            .ok_or_else(|| ChainError::Io("state has no block-log handle".into()))?;
        let offset = append_record(db, &record)?;

        debug!(
            number = block.header.number,
            hash = %hash,
            txs = block.txs.len(),
            offset,
            "block appended"
        );

        self.commit(block, hash, staged, offset);
        Ok(hash)
    }

    /// Run the chain rule and the per-transaction rules against a scratch
    /// copy. Returns the staged maps and the block hash without touching
    /// `self`.
    fn validate_and_stage(&self, block: &Block) -> Result<(Staged, Hash), ChainError> {
        let hash = block.hash()?;

        match &self.latest_block {
            None => {
                if block.header.number != 0 {
                    return Err(ChainError::BadChain(format!(
                        "first block must have number 0, got {}",
                        block.header.number
                    )));
                }
                if !block.header.parent.is_empty() {
                    return Err(ChainError::BadChain(
                        "first block must have the empty parent hash".into(),
                    ));
                }
            }
            Some(latest) => {
                let expected = latest.header.number + 1;
                if block.header.number != expected {
                    return Err(ChainError::BadChain(format!(
                        "expected block number {expected}, got {}",
                        block.header.number
                    )));
                }
                if block.header.parent != self.latest_hash {
                    return Err(ChainError::BadChain(format!(
                        "expected parent {}, got {}",
                        self.latest_hash, block.header.parent
                    )));
                }
                if !is_block_hash_valid(&hash, self.mining_difficulty) {
                    return Err(ChainError::BadChain(format!(
                        "hash {hash} does not satisfy difficulty {}",
                        self.mining_difficulty
                    )));
                }
            }
        }

        let is_tip1 = self.is_tip1_fork();
        let mut balances = self.balances.clone();
        let mut nonces = self.account_nonces.clone();

        for tx in &block.txs {
            apply_tx_to(&mut balances, &mut nonces, tx, is_tip1)?;
        }

        // Reward is credited only after every transaction validated.
        let fees = if is_tip1 {
            block.gas_reward()
        } else {
            TX_FEE * block.txs.len() as u64
        };
        *balances.entry(block.header.miner).or_insert(0) += BLOCK_REWARD + fees;

        Ok((Staged { balances, nonces }, hash))
    }

    /// Swap staged maps in and advance the tip. Infallible by design —
    /// everything that can fail happened before this point.
    fn commit(&mut self, block: Block, hash: Hash, staged: Staged, offset: u64) {
        self.balances = staged.balances;
        self.account_nonces = staged.nonces;
        self.height_index.insert(block.header.number, offset);
        self.hash_index.insert(hash, offset);
        self.latest_hash = hash;
        self.latest_block = Some(block);
    }

    // -- Pending copy --------------------------------------------------------

    /// Deep-copy this state for speculative admission validation.
    ///
    /// The copy shares nothing with the original: it has no append handle
    /// and no offset indexes, so it can never write. It is discarded and
    /// re-cloned after every confirmed block.
    pub fn pending_copy(&self) -> State {
        State {
            data_dir: self.data_dir.clone(),
            balances: self.balances.clone(),
            account_nonces: self.account_nonces.clone(),
            latest_block: self.latest_block.clone(),
            latest_hash: self.latest_hash,
            hash_index: HashMap::new(),
            height_index: HashMap::new(),
            db: None,
            mining_difficulty: self.mining_difficulty,
            fork_tip1: self.fork_tip1,
        }
    }

    // -- Lookups -------------------------------------------------------------

    /// Fetch a persisted block record by height.
    pub fn block_by_height(&self, height: u64) -> Result<BlockRecord, ChainError> {
        let offset = self
            .height_index
            .get(&height)
            .ok_or_else(|| ChainError::NotFound(format!("no block at height {height}")))?;
        record_at(&self.data_dir, *offset)
    }

    /// Fetch a persisted block record by hash.
    pub fn block_by_hash(&self, hash: &Hash) -> Result<BlockRecord, ChainError> {
        let offset = self
            .hash_index
            .get(hash)
            .ok_or_else(|| ChainError::NotFound(format!("no block with hash {hash}")))?;
        record_at(&self.data_dir, *offset)
    }

    /// The data directory this state was loaded from.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Flush the block-log append handle.
    pub fn flush(&mut self) -> Result<(), ChainError> {
        if let Some(db) = self.db.as_mut() {
            db.sync_all()?;
        }
        Ok(())
    }
}

/// Scratch maps staged by validation, committed atomically.
struct Staged {
    balances: HashMap<Address, u64>,
    nonces: HashMap<Address, u64>,
}

// ---------------------------------------------------------------------------
// Transaction rules
// ---------------------------------------------------------------------------

/// The per-transaction state transition, shared by mempool admission and
/// block application.
fn apply_tx_to(
    balances: &mut HashMap<Address, u64>,
    nonces: &mut HashMap<Address, u64>,
    tx: &SignedTx,
    is_tip1: bool,
) -> Result<(), ChainError> {
    if !tx.is_authentic() {
        return Err(ChainError::Forged);
    }

    let expected = nonces.get(&tx.tx.from).copied().unwrap_or(0) + 1;
    if tx.tx.nonce != expected {
        return Err(ChainError::BadNonce {
            account: tx.tx.from,
            expected,
            got: tx.tx.nonce,
        });
    }

    if tx.tx.is_reward() {
        if is_tip1 {
            // Rewards are issued by the block-application step now, never
            // submitted as transactions.
            return Err(ChainError::ReservedData);
        }
        // Pre-fork lenience for replaying historical chains: credit the
        // recipient with no balance check and no debit.
        *balances.entry(tx.tx.to).or_insert(0) += tx.tx.value;
        nonces.insert(tx.tx.from, tx.tx.nonce);
        return Ok(());
    }

    let cost = tx.tx.cost(is_tip1);
    let sender_balance = balances.get(&tx.tx.from).copied().unwrap_or(0);
    if sender_balance < cost {
        return Err(ChainError::Insufficient {
            account: tx.tx.from,
            balance: sender_balance,
            cost,
        });
    }

    *balances.entry(tx.tx.from).or_insert(0) -= cost;
    *balances.entry(tx.tx.to).or_insert(0) += tx.tx.value;
    nonces.insert(tx.tx.from, tx.tx.nonce);

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TX_GAS_PRICE;
    use crate::crypto::keys::Keypair;
    use crate::storage::genesis::genesis_path;
    use crate::transaction::signing::sign_tx;
    use crate::transaction::types::Tx;
    use std::fs;

    const TEST_DIFFICULTY: u8 = 1;

    /// Write a genesis with the given balances and fork height, then load
    /// the state from it.
    fn state_with(
        balances: &[(Address, u64)],
        fork_tip_1: u64,
    ) -> (tempfile::TempDir, State) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(crate::config::DATABASE_DIR)).unwrap();

        let balance_map: HashMap<String, u64> = balances
            .iter()
            .map(|(addr, bal)| (addr.hex(), *bal))
            .collect();
        let genesis = serde_json::json!({
            "genesis_time": "2026-02-14T00:00:00Z",
            "symbol": "CIN",
            "balances": balance_map,
            "fork_tip_1": fork_tip_1,
        });
        fs::write(genesis_path(dir.path()), genesis.to_string()).unwrap();

        let state = State::new_from_disk(dir.path(), TEST_DIFFICULTY).unwrap();
        (dir, state)
    }

    /// Grind the PoW nonce until the block satisfies the difficulty.
    /// Non-genesis test blocks go through this; at difficulty 1 it takes
    /// a few hundred hashes.
    fn mine_for_tests(mut block: Block, difficulty: u8) -> Block {
        loop {
            if is_block_hash_valid(&block.hash().unwrap(), difficulty) {
                return block;
            }
            block.header.nonce += 1;
        }
    }

    fn transfer(kp: &Keypair, to: Address, value: u64, nonce: u64) -> SignedTx {
        sign_tx(
            Tx::with_gas(kp.address(), to, value, nonce, "", 1, DEFAULT_TX_GAS_PRICE),
            kp,
        )
        .unwrap()
    }

    fn total_supply(state: &State) -> u64 {
        state.balances().values().sum()
    }

    // -- Genesis seeding -----------------------------------------------------

    #[test]
    fn fresh_state_seeds_genesis_balances() {
        let kp = Keypair::generate();
        let (_dir, state) = state_with(&[(kp.address(), 1_000)], 0);

        assert_eq!(state.balance(&kp.address()), 1_000);
        assert_eq!(state.account_nonce(&kp.address()), 0);
        assert_eq!(state.next_account_nonce(&kp.address()), 1);
        assert!(!state.has_genesis_block());
        assert!(state.latest_hash().is_empty());
    }

    #[test]
    fn absent_accounts_read_as_zero() {
        let (_dir, state) = state_with(&[], 0);
        let nobody = Address::from_bytes([0xab; 20]);
        assert_eq!(state.balance(&nobody), 0);
        assert_eq!(state.account_nonce(&nobody), 0);
    }

    // -- apply_tx ------------------------------------------------------------

    #[test]
    fn apply_tx_moves_value_and_advances_nonce() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let (_dir, mut state) = state_with(&[(alice.address(), 1_000)], 0);

        let tx = transfer(&alice, bob, 100, 1);
        state.apply_tx(&tx).unwrap();

        // TIP1 active from genesis: cost = value + gas * gas_price.
        assert_eq!(state.balance(&alice.address()), 1_000 - 100 - 21);
        assert_eq!(state.balance(&bob), 100);
        assert_eq!(state.account_nonce(&alice.address()), 1);
    }

    #[test]
    fn apply_tx_twice_fails_with_bad_nonce() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let (_dir, mut state) = state_with(&[(alice.address(), 1_000)], 0);

        let tx = transfer(&alice, bob, 100, 1);
        state.apply_tx(&tx).unwrap();

        let err = state.apply_tx(&tx).unwrap_err();
        assert!(matches!(
            err,
            ChainError::BadNonce {
                expected: 2,
                got: 1,
                ..
            }
        ));
        // Rejection left balances alone.
        assert_eq!(state.balance(&bob), 100);
    }

    #[test]
    fn apply_tx_rejects_future_nonce() {
        let alice = Keypair::generate();
        let (_dir, mut state) = state_with(&[(alice.address(), 1_000)], 0);

        let tx = transfer(&alice, Address::from_bytes([2; 20]), 1, 5);
        assert!(matches!(
            state.apply_tx(&tx).unwrap_err(),
            ChainError::BadNonce { expected: 1, got: 5, .. }
        ));
    }

    #[test]
    fn apply_tx_rejects_insufficient_funds() {
        let alice = Keypair::generate();
        let (_dir, mut state) = state_with(&[(alice.address(), 50)], 0);

        let tx = transfer(&alice, Address::from_bytes([2; 20]), 100, 1);
        let err = state.apply_tx(&tx).unwrap_err();
        assert!(matches!(err, ChainError::Insufficient { balance: 50, .. }));
        assert_eq!(state.balance(&alice.address()), 50);
    }

    #[test]
    fn apply_tx_rejects_forged_signature() {
        let alice = Keypair::generate();
        let (_dir, mut state) = state_with(&[(alice.address(), 1_000)], 0);

        let mut tx = transfer(&alice, Address::from_bytes([2; 20]), 100, 1);
        tx.tx.value = 999;
        assert!(matches!(
            state.apply_tx(&tx).unwrap_err(),
            ChainError::Forged
        ));
    }

    #[test]
    fn reward_tagged_tx_rejected_post_fork() {
        let alice = Keypair::generate();
        let (_dir, mut state) = state_with(&[(alice.address(), 1_000)], 0);

        let tx = sign_tx(
            Tx::new(alice.address(), Address::from_bytes([2; 20]), 100, 1, "reward"),
            &alice,
        )
        .unwrap();
        assert!(matches!(
            state.apply_tx(&tx).unwrap_err(),
            ChainError::ReservedData
        ));
    }

    #[test]
    fn reward_tagged_tx_credits_without_debit_pre_fork() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        // Fork far away: legacy rules apply.
        let (_dir, mut state) = state_with(&[(alice.address(), 0)], 1_000);

        let tx = sign_tx(Tx::new(alice.address(), bob, 77, 1, "reward"), &alice).unwrap();
        state.apply_tx(&tx).unwrap();

        assert_eq!(state.balance(&bob), 77);
        assert_eq!(state.balance(&alice.address()), 0);
        assert_eq!(state.account_nonce(&alice.address()), 1);
    }

    // -- apply_block ---------------------------------------------------------

    #[test]
    fn genesis_block_needs_number_zero_and_empty_parent() {
        let (_dir, mut state) = state_with(&[], 0);

        let wrong_number = Block::new(Hash::empty(), 1, 0, 0, Address::zero(), vec![]);
        assert!(matches!(
            state.apply_block(wrong_number).unwrap_err(),
            ChainError::BadChain(_)
        ));

        let wrong_parent = Block::new(
            Hash(crate::crypto::hash::sha256(b"bogus")),
            0,
            0,
            0,
            Address::zero(),
            vec![],
        );
        assert!(matches!(
            state.apply_block(wrong_parent).unwrap_err(),
            ChainError::BadChain(_)
        ));

        let ok = Block::new(Hash::empty(), 0, 0, 0, Address::zero(), vec![]);
        state.apply_block(ok).unwrap();
        assert!(state.has_genesis_block());
        assert_eq!(state.latest_number(), 0);
    }

    #[test]
    fn non_genesis_block_must_satisfy_pow() {
        let miner = Address::from_bytes([7; 20]);
        let (_dir, mut state) = state_with(&[], 0);

        state
            .apply_block(Block::new(Hash::empty(), 0, 0, 0, miner, vec![]))
            .unwrap();

        // An unmined follow-up whose hash misses the difficulty target.
        let mut child = Block::new(state.latest_hash(), 1, 0, 1, miner, vec![]);
        while is_block_hash_valid(&child.hash().unwrap(), TEST_DIFFICULTY) {
            child.header.time += 1;
        }
        assert!(matches!(
            state.apply_block(child).unwrap_err(),
            ChainError::BadChain(_)
        ));

        let mined = mine_for_tests(
            Block::new(state.latest_hash(), 1, 0, 1, miner, vec![]),
            TEST_DIFFICULTY,
        );
        state.apply_block(mined).unwrap();
        assert_eq!(state.latest_number(), 1);
    }

    #[test]
    fn block_with_bad_tx_rolls_back_entirely() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let miner = Address::from_bytes([7; 20]);
        let (_dir, mut state) = state_with(&[(alice.address(), 1_000)], 0);

        let good = transfer(&alice, bob, 100, 1);
        let bad = transfer(&alice, bob, 100, 5); // nonce gap

        let block = Block::new(Hash::empty(), 0, 0, 0, miner, vec![good, bad]);
        assert!(matches!(
            state.apply_block(block).unwrap_err(),
            ChainError::BadNonce { .. }
        ));

        // Nothing moved, nothing persisted.
        assert_eq!(state.balance(&alice.address()), 1_000);
        assert_eq!(state.balance(&bob), 0);
        assert!(!state.has_genesis_block());
        assert!(crate::storage::log::scan_records(state.data_dir())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn conservation_tip1_block_creates_exactly_the_reward() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let miner = Address::from_bytes([7; 20]);
        let (_dir, mut state) = state_with(&[(alice.address(), 10_000)], 0);

        let before = total_supply(&state);
        let txs = vec![transfer(&alice, bob, 100, 1), transfer(&alice, bob, 200, 2)];
        let block = Block::new(Hash::empty(), 0, 0, 0, miner, txs);
        state.apply_block(block).unwrap();

        assert_eq!(total_supply(&state), before + BLOCK_REWARD);
        // Gas fees circulated from Alice to the miner.
        assert_eq!(state.balance(&miner), BLOCK_REWARD + 2 * 21);
        assert_eq!(state.balance(&alice.address()), 10_000 - 300 - 2 * 21);
        assert_eq!(state.balance(&bob), 300);
    }

    #[test]
    fn conservation_legacy_block_creates_exactly_the_reward() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let miner = Address::from_bytes([7; 20]);
        // Fork never activates during this test.
        let (_dir, mut state) = state_with(&[(alice.address(), 10_000)], 1_000);

        let before = total_supply(&state);
        let tx = sign_tx(Tx::new(alice.address(), bob, 100, 1, ""), &alice).unwrap();
        let block = Block::new(Hash::empty(), 0, 0, 0, miner, vec![tx]);
        state.apply_block(block).unwrap();

        assert_eq!(total_supply(&state), before + BLOCK_REWARD);
        assert_eq!(state.balance(&miner), BLOCK_REWARD + TX_FEE);
        assert_eq!(state.balance(&alice.address()), 10_000 - 100 - TX_FEE);
        assert_eq!(state.balance(&bob), 100);
    }

    #[test]
    fn fork_activates_at_the_configured_height() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let miner = Address::from_bytes([7; 20]);
        let (_dir, mut state) = state_with(&[(alice.address(), 10_000)], 1);

        // Block 0 applies under legacy rules (tip height 0 < fork 1).
        assert!(!state.is_tip1_fork());
        let tx0 = sign_tx(Tx::with_gas(alice.address(), bob, 100, 1, "", 1, 21), &alice).unwrap();
        state
            .apply_block(Block::new(Hash::empty(), 0, 0, 0, miner, vec![tx0]))
            .unwrap();
        assert_eq!(state.balance(&alice.address()), 10_000 - 100 - TX_FEE);
        assert_eq!(state.balance(&miner), BLOCK_REWARD + TX_FEE);

        // Activation compares the tip: after block 0 the tip is 0 < 1, so
        // block 1 still applies legacy; once the tip reaches 1, gas
        // pricing takes over.
        assert!(!state.is_tip1_fork());
        let tx1 = sign_tx(Tx::with_gas(alice.address(), bob, 100, 2, "", 1, 21), &alice).unwrap();
        let block1 = mine_for_tests(
            Block::new(state.latest_hash(), 1, 0, 10, miner, vec![tx1]),
            TEST_DIFFICULTY,
        );
        let alice_before = state.balance(&alice.address());
        state.apply_block(block1).unwrap();
        assert_eq!(state.balance(&alice.address()), alice_before - 100 - TX_FEE);

        assert!(state.is_tip1_fork());
        let tx2 = sign_tx(Tx::with_gas(alice.address(), bob, 100, 3, "", 1, 21), &alice).unwrap();
        let block2 = mine_for_tests(
            Block::new(state.latest_hash(), 2, 0, 20, miner, vec![tx2]),
            TEST_DIFFICULTY,
        );
        let alice_before = state.balance(&alice.address());
        state.apply_block(block2).unwrap();
        assert_eq!(state.balance(&alice.address()), alice_before - 100 - 21);
    }

    // -- Pending copy --------------------------------------------------------

    #[test]
    fn pending_copy_is_independent() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let (_dir, mut state) = state_with(&[(alice.address(), 1_000)], 0);

        let mut pending = state.pending_copy();
        pending.apply_tx(&transfer(&alice, bob, 100, 1)).unwrap();

        // The speculative mutation is invisible to the confirmed state.
        assert_eq!(state.balance(&bob), 0);
        assert_eq!(state.account_nonce(&alice.address()), 0);
        assert_eq!(pending.balance(&bob), 100);

        // And the pending copy sees its own effects for chained nonces.
        pending.apply_tx(&transfer(&alice, bob, 100, 2)).unwrap();
        assert_eq!(pending.account_nonce(&alice.address()), 2);

        // A pending copy can never append to the log.
        let block = Block::new(Hash::empty(), 0, 0, 0, Address::zero(), vec![]);
        assert!(state.apply_block(block.clone()).is_ok());
        let mut pending2 = state.pending_copy();
        let next = Block::new(pending2.latest_hash(), 1, 0, 1, Address::zero(), vec![]);
        assert!(pending2.apply_block(next).is_err());
    }

    // -- Persistence & indexes -----------------------------------------------

    #[test]
    fn state_replays_identically_from_disk() {
        let alice = Keypair::generate();
        let bob = Address::from_bytes([2; 20]);
        let miner = Address::from_bytes([7; 20]);
        let (dir, mut state) = state_with(&[(alice.address(), 10_000)], 0);

        let tx = transfer(&alice, bob, 100, 1);
        state
            .apply_block(Block::new(Hash::empty(), 0, 0, 0, miner, vec![tx]))
            .unwrap();
        let tx2 = transfer(&alice, bob, 50, 2);
        let block1 = mine_for_tests(
            Block::new(state.latest_hash(), 1, 0, 10, miner, vec![tx2]),
            TEST_DIFFICULTY,
        );
        state.apply_block(block1).unwrap();

        let reloaded = State::new_from_disk(dir.path(), TEST_DIFFICULTY).unwrap();
        assert_eq!(reloaded.latest_hash(), state.latest_hash());
        assert_eq!(reloaded.latest_number(), 1);
        assert_eq!(reloaded.balances(), state.balances());
        assert_eq!(
            reloaded.account_nonce(&alice.address()),
            state.account_nonce(&alice.address())
        );
    }

    #[test]
    fn height_and_hash_lookups_agree() {
        let miner = Address::from_bytes([7; 20]);
        let (_dir, mut state) = state_with(&[], 0);

        state
            .apply_block(Block::new(Hash::empty(), 0, 0, 0, miner, vec![]))
            .unwrap();
        let block1 = mine_for_tests(
            Block::new(state.latest_hash(), 1, 0, 10, miner, vec![]),
            TEST_DIFFICULTY,
        );
        let hash1 = state.apply_block(block1).unwrap();

        let by_height = state.block_by_height(1).unwrap();
        let by_hash = state.block_by_hash(&hash1).unwrap();
        assert_eq!(by_height, by_hash);
        assert_eq!(by_height.block.header.number, 1);
        assert_eq!(by_height.hash, hash1);
    }

    #[test]
    fn unknown_lookups_fail_with_not_found() {
        let (_dir, state) = state_with(&[], 0);
        assert!(matches!(
            state.block_by_height(3).unwrap_err(),
            ChainError::NotFound(_)
        ));
        let ghost = Hash(crate::crypto::hash::sha256(b"ghost"));
        assert!(matches!(
            state.block_by_hash(&ghost).unwrap_err(),
            ChainError::NotFound(_)
        ));
    }
}
