//! # CLI Interface
//!
//! Command-line argument structure for `cinder-node` using `clap`
//! derive. Four subcommands: `run`, `init`, `balances`, and `version`.
//! Every configurable value has an environment-variable fallback for
//! container deployments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cinder_protocol::config::DEFAULT_MINING_DIFFICULTY;

/// Cinder proof-of-work blockchain node.
///
/// Maintains the replicated ledger, mines pending transactions, and
/// serves the HTTP API peers and wallets talk to.
#[derive(Parser, Debug)]
#[command(name = "cinder-node", about = "Cinder blockchain node", version)]
pub struct CinderNodeCli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node: mining loop plus HTTP API.
    Run(RunArgs),
    /// Initialize a data directory and optionally create an account.
    Init(InitArgs),
    /// Print every account balance from the local chain.
    Balances(BalancesArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Node data directory (chain database + keystore). Created on first
    /// run if absent.
    #[arg(long, short = 'd', env = "CINDER_DATA_DIR", default_value = "~/.cinder")]
    pub data_dir: PathBuf,

    /// Bind address for the HTTP API.
    #[arg(long, env = "CINDER_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub http_addr: String,

    /// Account (0x-hex) credited with mining rewards. Defaults to the
    /// zero address, which burns the rewards.
    #[arg(long, env = "CINDER_MINER")]
    pub miner: Option<String>,

    /// Mining difficulty: leading zero bytes required of a block hash.
    #[arg(long, env = "CINDER_DIFFICULTY", default_value_t = DEFAULT_MINING_DIFFICULTY)]
    pub difficulty: u8,

    /// Bootstrap peer as `ip:port`, registered at startup.
    #[arg(long, env = "CINDER_BOOTSTRAP")]
    pub bootstrap: Option<String>,

    /// Account (0x-hex) the bootstrap peer mines to.
    #[arg(long, env = "CINDER_BOOTSTRAP_ACCOUNT")]
    pub bootstrap_account: Option<String>,

    /// Log verbosity: trace, debug, info, warn, error.
    #[arg(long, env = "CINDER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format: pretty or json.
    #[arg(long, env = "CINDER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Data directory to initialize.
    #[arg(long, short = 'd', env = "CINDER_DATA_DIR", default_value = "~/.cinder")]
    pub data_dir: PathBuf,

    /// If set, also create a keystore account sealed under this password
    /// and print its address.
    #[arg(long)]
    pub password: Option<String>,
}

/// Arguments for the `balances` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BalancesArgs {
    /// Data directory holding the chain.
    #[arg(long, short = 'd', env = "CINDER_DATA_DIR", default_value = "~/.cinder")]
    pub data_dir: PathBuf,
}

/// Expand a leading `~` to the user's home directory. Paths without the
/// prefix pass through unchanged.
pub fn resolve_data_dir(path: &std::path::Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if path_str.starts_with("~/") || path_str == "~" {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return home.join(path_str.strip_prefix("~/").unwrap_or(""));
        }
    }
    path.to_path_buf()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
