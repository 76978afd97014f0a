//! # Network
//!
//! The node-side runtime: the transaction pool, the proof-of-work miner,
//! and the orchestrator that owns the chain state and races the local
//! miner against peer-synced blocks.
//!
//! ```text
//! mempool.rs — pending pool + mined-transaction archive
//! miner.rs   — cancelable nonce search over a block template
//! node.rs    — the orchestrator: admission, block application, mining loop
//! ```

pub mod mempool;
pub mod miner;
pub mod node;

pub use mempool::Mempool;
pub use miner::{mine, PendingBlock};
pub use node::{Node, NodeConfig, PeerNode};
