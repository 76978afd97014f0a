//! # Keys & Recoverable Signatures
//!
//! secp256k1 ECDSA in its recoverable form: a signature is 65 bytes
//! (`r || s || v`), and the public key — hence the sender's address — is
//! recovered from the signature itself. Transactions therefore carry no
//! explicit public key; the address recovered over the signed payload
//! either matches `from` or the transaction is forged.
//!
//! All signing hashes the message with SHA-256 first; the curve operates
//! on the 32-byte digest.
//!
//! `Keypair` intentionally does NOT implement `Serialize`/`Deserialize`.
//! Persisting a private key is a deliberate act that goes through the
//! keystore, not something serde should ever do by accident.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::config::{ADDRESS_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::address::Address;
use crate::crypto::hash::{keccak256, sha256};

/// Errors from key handling and signature recovery.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("signature recovery failed: {0}")]
    RecoveryFailed(String),
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 65-byte recoverable ECDSA signature: 64 compact bytes plus the
/// recovery id. Serializes as 130 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Construct from raw bytes, enforcing the 65-byte layout.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            KeyError::MalformedSignature(format!(
                "expected {SIGNATURE_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Signature(arr))
    }

    /// Lowercase hex, no prefix.
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    fn to_recoverable(self) -> Result<RecoverableSignature, KeyError> {
        let rec_id = RecoveryId::from_i32(i32::from(self.0[64]))
            .map_err(|e| KeyError::MalformedSignature(e.to_string()))?;
        RecoverableSignature::from_compact(&self.0[..64], rec_id)
            .map_err(|e| KeyError::MalformedSignature(e.to_string()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.hex()[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Signature::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// A secp256k1 keypair bound to its derived account address.
pub struct Keypair {
    secret: SecretKey,
    public: PublicKey,
    address: Address,
}

impl Keypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut OsRng);
        let address = address_of(&public);
        Self {
            secret,
            public,
            address,
        }
    }

    /// Reconstruct a keypair from 32 secret-key bytes (keystore path).
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidSecretKey)?;
        let secp = Secp256k1::new();
        let public = PublicKey::from_secret_key(&secp, &secret);
        let address = address_of(&public);
        Ok(Self {
            secret,
            public,
            address,
        })
    }

    /// The 32 secret-key bytes. Only the keystore should call this.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    /// The account address derived from this keypair's public key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a message: SHA-256 the bytes, then produce a recoverable
    /// ECDSA signature over the digest. Output is always 65 bytes.
    pub fn sign(&self, msg: &[u8]) -> Signature {
        let secp = Secp256k1::new();
        let digest = Message::from_digest(sha256(msg));
        let recoverable = secp.sign_ecdsa_recoverable(&digest, &self.secret);
        let (rec_id, compact) = recoverable.serialize_compact();

        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..64].copy_from_slice(&compact);
        out[64] = rec_id.to_i32() as u8;
        Signature(out)
    }

    /// The uncompressed public key (65 bytes, leading 0x04).
    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        self.public.serialize_uncompressed()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        write!(f, "Keypair({})", self.address)
    }
}

// ---------------------------------------------------------------------------
// Recovery & Address Derivation
// ---------------------------------------------------------------------------

/// Recover the public key that produced `sig` over `SHA-256(msg)`.
pub fn recover_pubkey(msg: &[u8], sig: &Signature) -> Result<PublicKey, KeyError> {
    let secp = Secp256k1::new();
    let digest = Message::from_digest(sha256(msg));
    let recoverable = sig.to_recoverable()?;
    secp.recover_ecdsa(&digest, &recoverable)
        .map_err(|e| KeyError::RecoveryFailed(e.to_string()))
}

/// Recover the signing account's address from a message and signature.
pub fn recover_address(msg: &[u8], sig: &Signature) -> Result<Address, KeyError> {
    Ok(address_of(&recover_pubkey(msg, sig)?))
}

/// Derive the account address from a public key: the last 20 bytes of
/// Keccak-256 over the uncompressed key without its leading byte.
pub fn address_of(public: &PublicKey) -> Address {
    let uncompressed = public.serialize_uncompressed();
    let digest = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; ADDRESS_LENGTH];
    bytes.copy_from_slice(&digest[32 - ADDRESS_LENGTH..]);
    Address::from_bytes(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
