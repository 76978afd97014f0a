//! Cryptographic primitives: SHA-256 content hashing, Keccak-256 address
//! derivation, and recoverable secp256k1 ECDSA.
//!
//! Cinder deliberately uses the Ethereum-compatible combination — SHA-256
//! for content hashes, Keccak-256 for addresses, secp256k1 for signatures —
//! so accounts and tooling interoperate with the existing ecosystem.

pub mod address;
pub mod hash;
pub mod keys;

pub use address::Address;
pub use hash::{keccak256, sha256, Hash};
pub use keys::{Keypair, Signature};
