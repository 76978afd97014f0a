//! # Transactions
//!
//! Construction, signing, and authenticity checking for Cinder value
//! transfers.
//!
//! ```text
//! types.rs   — Tx / SignedTx, cost accounting, authenticity
//! signing.rs — sign_tx: canonical encoding -> recoverable signature
//! ```
//!
//! A transaction's canonical encoding is the deterministic JSON
//! serialization of its fields in declared order; the signature covers
//! SHA-256 of that encoding. The content hash (mempool/archive key) is
//! SHA-256 of the *signed* transaction's JSON, so the same transfer
//! signed twice (with different `time` salts) yields distinct entries.

pub mod signing;
pub mod types;

pub use signing::sign_tx;
pub use types::{SignedTx, Tx};
