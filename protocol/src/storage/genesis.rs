//! Genesis file and data-directory bootstrap.
//!
//! The data directory layout:
//!
//! ```text
//! <datadir>/
//! ├── database/
//! │   ├── genesis.json   initial balances, coin symbol, fork height
//! │   └── block.db       append-only block log (one JSON record per line)
//! └── keystore/          encrypted account key files
//! ```
//!
//! `init_datadir` is idempotent: it creates whatever is missing and never
//! touches what exists, so calling it on every startup is safe.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BLOCK_DB_FILE, DATABASE_DIR, GENESIS_FILE};
use crate::crypto::address::Address;
use crate::error::ChainError;

/// The genesis shipped with a fresh data directory: one pre-funded
/// bootstrap account and TIP1 active from the first block.
const DEFAULT_GENESIS_JSON: &str = r#"{
  "genesis_time": "2026-02-14T00:00:00Z",
  "symbol": "CIN",
  "balances": {
    "0x23ba76a8aeb6080115c4e71bb598ab5094432d8c": 1000000000
  },
  "fork_tip_1": 0
}
"#;

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// Parsed contents of `genesis.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    /// Informational creation timestamp; not consensus-relevant.
    #[serde(default)]
    pub genesis_time: String,
    /// Coin ticker symbol.
    pub symbol: String,
    /// Initial account balances seeded before any block is applied.
    pub balances: HashMap<Address, u64>,
    /// Height at which the TIP1 fee fork activates. 0 means active from
    /// genesis.
    #[serde(default)]
    pub fork_tip_1: u64,
}

/// Load and parse the genesis file for a data directory.
pub fn load_genesis(data_dir: &Path) -> Result<Genesis, ChainError> {
    let content = fs::read_to_string(genesis_path(data_dir))?;
    Ok(serde_json::from_str(&content)?)
}

// ---------------------------------------------------------------------------
// Data Directory
// ---------------------------------------------------------------------------

/// Path to `<datadir>/database/genesis.json`.
pub fn genesis_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_DIR).join(GENESIS_FILE)
}

/// Path to `<datadir>/database/block.db`.
pub fn block_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_DIR).join(BLOCK_DB_FILE)
}

/// Initialize a data directory: create `database/`, write the default
/// genesis if absent, and touch an empty block log if absent.
pub fn init_datadir(data_dir: &Path) -> Result<(), ChainError> {
    fs::create_dir_all(data_dir.join(DATABASE_DIR))?;

    let genesis = genesis_path(data_dir);
    if !genesis.exists() {
        fs::write(&genesis, DEFAULT_GENESIS_JSON)?;
    }

    let block_db = block_db_path(data_dir);
    if !block_db.exists() {
        fs::write(&block_db, b"")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        init_datadir(dir.path()).unwrap();

        assert!(genesis_path(dir.path()).exists());
        assert!(block_db_path(dir.path()).exists());

        let genesis = load_genesis(dir.path()).unwrap();
        assert_eq!(genesis.symbol, "CIN");
        assert_eq!(genesis.fork_tip_1, 0);
        assert_eq!(genesis.balances.len(), 1);
    }

    #[test]
    fn init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        init_datadir(dir.path()).unwrap();

        // Scribble a custom genesis, re-init, and confirm it survives.
        let custom = r#"{"symbol":"XX","balances":{},"fork_tip_1":9}"#;
        fs::write(genesis_path(dir.path()), custom).unwrap();
        init_datadir(dir.path()).unwrap();

        let genesis = load_genesis(dir.path()).unwrap();
        assert_eq!(genesis.symbol, "XX");
        assert_eq!(genesis.fork_tip_1, 9);
    }

    #[test]
    fn missing_fork_height_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(DATABASE_DIR)).unwrap();
        fs::write(
            genesis_path(dir.path()),
            r#"{"symbol":"CIN","balances":{"0x23ba76a8aeb6080115c4e71bb598ab5094432d8c":42}}"#,
        )
        .unwrap();

        let genesis = load_genesis(dir.path()).unwrap();
        assert_eq!(genesis.fork_tip_1, 0);
        let addr: Address = "0x23ba76a8aeb6080115c4e71bb598ab5094432d8c".parse().unwrap();
        assert_eq!(genesis.balances[&addr], 42);
    }

    #[test]
    fn load_from_uninitialized_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_genesis(dir.path()).is_err());
    }
}
