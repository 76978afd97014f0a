//! # Protocol Configuration & Constants
//!
//! Every magic number in Cinder lives here. Consensus-critical values
//! (reward, fees, difficulty) sit next to the operational knobs (ports,
//! intervals, channel capacities) so a chain-parameter change is a
//! one-file diff.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Issuance & Fees
// ---------------------------------------------------------------------------

/// Fixed issuance credited to the miner of every valid block, on top of
/// the collected transaction fees.
pub const BLOCK_REWARD: u64 = 100;

/// Flat per-transaction fee charged before the TIP1 fork activates.
/// After activation the fee is `gas * gas_price` instead.
pub const TX_FEE: u64 = 50;

/// Default gas limit stamped on transactions submitted via the HTTP API
/// when the caller does not provide one.
pub const DEFAULT_TX_GAS: u64 = 1;

/// Default gas price stamped on transactions submitted via the HTTP API
/// when the caller does not provide one.
pub const DEFAULT_TX_GAS_PRICE: u64 = 21;

/// The `data` value reserved for pre-fork block rewards. Transactions
/// carrying this tag are rejected from the mempool once TIP1 is active;
/// rewards are credited by the block-application step, not as transactions.
pub const REWARD_DATA: &str = "reward";

// ---------------------------------------------------------------------------
// Mining
// ---------------------------------------------------------------------------

/// Default mining difficulty: the number of leading zero bytes a block
/// hash must carry. The byte after the zero run must be non-zero — see
/// `storage::block::is_block_hash_valid`.
pub const DEFAULT_MINING_DIFFICULTY: u8 = 3;

/// How often the mining loop checks the mempool for work.
pub const MINING_INTERVAL: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Recoverable ECDSA signature length: `r || s || v` (64 + 1 bytes).
pub const SIGNATURE_LENGTH: usize = 65;

/// Account address length in bytes (Ethereum-style truncated Keccak-256).
pub const ADDRESS_LENGTH: usize = 20;

/// SHA-256 digest length in bytes.
pub const HASH_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Capacity of the `new_pending_txs` channel. Generous, so a burst of
/// submissions never blocks the HTTP handlers on the gossip consumer.
pub const PENDING_TX_CHANNEL_CAPACITY: usize = 10_000;

/// Capacity of the `new_synced_blocks` channel. Peer blocks arrive at
/// most a few per mining interval; a small buffer is plenty.
pub const SYNCED_BLOCKS_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Network Defaults
// ---------------------------------------------------------------------------

/// Default HTTP listen port for the node API.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default IP the node reports to peers.
pub const DEFAULT_IP: &str = "127.0.0.1";

/// Miner address used when a node runs without a configured account:
/// the all-zero address. Rewards credited to it are effectively burned.
pub const DEFAULT_MINER: &str = "0x0000000000000000000000000000000000000000";

// ---------------------------------------------------------------------------
// Data Directory Layout
// ---------------------------------------------------------------------------

/// Subdirectory of the data dir holding chain data.
pub const DATABASE_DIR: &str = "database";

/// Genesis file name inside [`DATABASE_DIR`].
pub const GENESIS_FILE: &str = "genesis.json";

/// Block log file name inside [`DATABASE_DIR`].
pub const BLOCK_DB_FILE: &str = "block.db";

/// Subdirectory of the data dir holding encrypted account key files.
pub const KEYSTORE_DIR: &str = "keystore";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_exceeds_legacy_fee() {
        // A miner must always net something even on a one-tx legacy block.
        assert!(BLOCK_REWARD > 0);
        assert!(TX_FEE > 0);
    }

    #[test]
    fn signature_length_is_recoverable_ecdsa() {
        // 64 compact bytes + 1 recovery id.
        assert_eq!(SIGNATURE_LENGTH, 65);
    }

    #[test]
    fn mining_interval_is_positive() {
        assert!(MINING_INTERVAL > Duration::ZERO);
    }

    #[test]
    fn default_miner_parses_as_zero_address() {
        assert_eq!(DEFAULT_MINER.len(), 2 + ADDRESS_LENGTH * 2);
        assert!(DEFAULT_MINER[2..].bytes().all(|b| b == b'0'));
    }
}
