// Copyright (c) 2026 Cinder Labs. MIT License.
// See LICENSE for details.

//! # Cinder Protocol — Core Library
//!
//! A small proof-of-work blockchain: a replicated, append-only ledger of
//! value transfers between accounts, secured by secp256k1 ECDSA
//! signatures and a Hashcash-style mining puzzle.
//!
//! ## Architecture
//!
//! The crate is split along the node's actual concerns:
//!
//! - **crypto** — SHA-256 content hashing, Keccak-256 addresses,
//!   recoverable ECDSA. The identity layer everything else leans on.
//! - **transaction** — construction, signing, cost accounting, and the
//!   authenticity check that makes forgery and replay fail.
//! - **storage** — the append-only block log, genesis bootstrap, and the
//!   state engine that replays the log into balances and nonces.
//! - **network** — the mempool, the cancelable miner, and the node
//!   orchestrator that races local mining against peer-synced blocks.
//! - **keystore** — password-sealed account keys; the signing oracle
//!   behind the HTTP submission path.
//! - **config** — protocol constants and network parameters.
//!
//! ## Design stance
//!
//! 1. The block log on disk is the source of truth; all in-memory state
//!    is derived by deterministic replay.
//! 2. State transitions never partially apply — validate on a scratch
//!    copy, commit atomically.
//! 3. Hashes are defined over canonical JSON with pinned field order.
//!    Anything that would make serialization nondeterministic is a bug
//!    in consensus, not a style issue.
//! 4. Peer blocks beat local mining: cancellation is cooperative,
//!    hierarchical, and observed on every nonce attempt.

pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod network;
pub mod storage;
pub mod transaction;

pub use error::ChainError;
