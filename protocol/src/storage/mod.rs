//! # Storage
//!
//! The persistent chain and the in-memory state derived from it.
//!
//! ```text
//! block.rs   — Block / BlockHeader, block hashing, the PoW predicate
//! genesis.rs — genesis.json, data-directory bootstrap
//! log.rs     — append-only block log, scan + offset-seek access
//! state.rs   — the state engine: apply_tx / apply_block, pending copies
//! ```
//!
//! The block log is the source of truth; everything else (balances,
//! nonces, the offset indexes) is derived by replay at startup.

pub mod block;
pub mod genesis;
pub mod log;
pub mod state;

pub use block::{is_block_hash_valid, Block, BlockHeader};
pub use genesis::{init_datadir, load_genesis, Genesis};
pub use log::{blocks_after, BlockRecord};
pub use state::State;
