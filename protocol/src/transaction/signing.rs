//! Transaction signing.
//!
//! Signing is a separate step from construction because the keypair may
//! not be available where the transaction is built (the HTTP handler
//! builds the transfer, the keystore holds the key). The signature covers
//! SHA-256 of the canonical encoding of the unsigned transaction.

use crate::crypto::keys::Keypair;
use crate::error::ChainError;
use crate::transaction::types::{SignedTx, Tx};

/// Sign a transaction with the given keypair.
///
/// The caller is responsible for `keypair.address() == tx.from`; a
/// mismatch produces a transaction that fails `is_authentic()` on every
/// node, so it cannot do damage — it just wastes a submission.
pub fn sign_tx(tx: Tx, keypair: &Keypair) -> Result<SignedTx, ChainError> {
    let encoded = tx.canonical_bytes()?;
    let sig = keypair.sign(&encoded);
    Ok(SignedTx { tx, sig })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::address::Address;

    #[test]
    fn sign_produces_authentic_tx() {
        let kp = Keypair::generate();
        let tx = Tx::new(kp.address(), Address::from_bytes([7; 20]), 10, 1, "");
        let signed = sign_tx(tx, &kp).unwrap();
        assert!(signed.is_authentic());
    }

    #[test]
    fn signing_with_foreign_key_fails_authenticity() {
        let sender = Keypair::generate();
        let imposter = Keypair::generate();

        // `from` claims the sender, but the imposter signs.
        let tx = Tx::new(sender.address(), Address::from_bytes([7; 20]), 10, 1, "");
        let signed = sign_tx(tx, &imposter).unwrap();
        assert!(!signed.is_authentic());
    }

    #[test]
    fn signing_is_deterministic_for_fixed_fields() {
        let kp = Keypair::generate();
        let mut tx = Tx::new(kp.address(), Address::from_bytes([7; 20]), 10, 1, "");
        tx.time = 1_700_000_000;

        let a = sign_tx(tx.clone(), &kp).unwrap();
        let b = sign_tx(tx, &kp).unwrap();
        // RFC 6979 nonces: same key + same payload = same signature.
        assert_eq!(a.sig, b.sig);
    }
}
