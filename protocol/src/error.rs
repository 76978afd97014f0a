//! Stable error kinds surfaced by the state engine and its callers.
//!
//! The variants carry enough context to explain a rejection to a submitter
//! without leaking internal state. `apply_tx` and `apply_block` guarantee
//! that any error leaves the state untouched — they work on a scratch copy
//! and swap it in only on success.

use thiserror::Error;

use crate::crypto::address::Address;

/// Errors produced by transaction admission, block application, mining,
/// and chain storage.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The signature does not recover to the claimed sender. Any mutation
    /// of the signed payload after signing lands here.
    #[error("forged transaction: signature does not recover to sender")]
    Forged,

    /// The transaction nonce is not exactly the sender's last nonce + 1.
    /// Both stale (replayed) and future nonces are rejected.
    #[error("bad nonce for {account}: expected {expected}, got {got}")]
    BadNonce {
        account: Address,
        expected: u64,
        got: u64,
    },

    /// The sender cannot cover value + fee.
    #[error("insufficient funds: {account} has {balance}, tx costs {cost}")]
    Insufficient {
        account: Address,
        balance: u64,
        cost: u64,
    },

    /// The `data` field value "reward" is reserved for block issuance and
    /// cannot be submitted once the TIP1 fork is active.
    #[error("the `data` value \"reward\" is reserved for block issuance")]
    ReservedData,

    /// Block number, parent linkage, or proof-of-work violates the chain
    /// rule against the current tip.
    #[error("block violates chain rule: {0}")]
    BadChain(String),

    /// A lookup by height or hash has no entry.
    #[error("not found: {0}")]
    NotFound(String),

    /// Mining was cancelled by the caller before a valid nonce was found.
    #[error("mining cancelled")]
    Canceled,

    /// Underlying file or encoding failure. Fatal on the block-log write
    /// path: the in-memory chain head would otherwise diverge from disk.
    #[error("i/o: {0}")]
    Io(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl ChainError {
    /// True for errors a read handler should report as a server-side
    /// failure rather than a bad request.
    pub fn is_io(&self) -> bool {
        matches!(self, ChainError::Io(_))
    }
}
