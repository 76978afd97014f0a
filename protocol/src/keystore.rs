//! # Keystore — the signing oracle
//!
//! Password-protected account keys under `<datadir>/keystore/`, one JSON
//! file per address:
//!
//! ```text
//! {"address":"0x…","salt":"<hex>","ciphertext":"<hex nonce||ct>"}
//! ```
//!
//! The secret key is sealed with AES-256-GCM; the AEAD key is derived
//! from the password and a per-file random salt via BLAKE3's `derive_key`
//! mode. A wrong password fails authentication on the GCM tag — there is
//! no way to distinguish "wrong password" from "corrupted file", and the
//! error deliberately doesn't try.
//!
//! The rest of the node treats this module as an oracle: give it an
//! address, a password, and a transaction; get back a signed transaction
//! or an error.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::config::KEYSTORE_DIR;
use crate::crypto::address::Address;
use crate::crypto::keys::Keypair;
use crate::transaction::signing::sign_tx;
use crate::transaction::types::{SignedTx, Tx};

/// Context string for the key-derivation mode. Changing it invalidates
/// every existing keystore file.
const KDF_CONTEXT: &str = "cinder keystore v1 account key";

const SALT_LENGTH: usize = 16;
const NONCE_LENGTH: usize = 12;

/// Keystore failures.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("no keystore entry for {0}")]
    UnknownAccount(Address),

    #[error("cannot unlock {0}: wrong password or corrupted key file")]
    UnlockFailed(Address),

    #[error("keystore entry for {0} is malformed")]
    Malformed(Address),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk shape of one keystore entry.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    address: Address,
    salt: String,
    ciphertext: String,
}

/// Path to `<datadir>/keystore/`.
pub fn keystore_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(KEYSTORE_DIR)
}

fn key_file_path(data_dir: &Path, account: &Address) -> PathBuf {
    keystore_dir(data_dir).join(format!("{}.json", account.hex()))
}

/// Generate a fresh account, seal its key under `password`, and return
/// the new address.
pub fn new_account(data_dir: &Path, password: &str) -> Result<Address, KeystoreError> {
    let keypair = Keypair::generate();
    let address = keypair.address();

    let mut salt = [0u8; SALT_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let sealed = seal(&derive_key(password, &salt), &keypair.secret_bytes())
        .map_err(|_| KeystoreError::UnlockFailed(address))?;

    let entry = KeyFile {
        address,
        salt: hex::encode(salt),
        ciphertext: hex::encode(sealed),
    };

    fs::create_dir_all(keystore_dir(data_dir))?;
    let path = key_file_path(data_dir, &address);
    fs::write(&path, serde_json::to_vec_pretty(&entry).expect("keyfile serializes"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(address)
}

/// Unlock an account's keypair with its password.
pub fn unlock_account(
    data_dir: &Path,
    account: &Address,
    password: &str,
) -> Result<Keypair, KeystoreError> {
    let path = key_file_path(data_dir, account);
    if !path.exists() {
        return Err(KeystoreError::UnknownAccount(*account));
    }

    let entry: KeyFile = serde_json::from_slice(&fs::read(&path)?)
        .map_err(|_| KeystoreError::Malformed(*account))?;

    let salt = hex::decode(&entry.salt).map_err(|_| KeystoreError::Malformed(*account))?;
    let sealed = hex::decode(&entry.ciphertext).map_err(|_| KeystoreError::Malformed(*account))?;

    let secret = open(&derive_key(password, &salt), &sealed)
        .map_err(|_| KeystoreError::UnlockFailed(*account))?;

    let keypair =
        Keypair::from_secret_bytes(&secret).map_err(|_| KeystoreError::Malformed(*account))?;

    if keypair.address() != *account {
        return Err(KeystoreError::Malformed(*account));
    }

    Ok(keypair)
}

/// Sign a transaction with a stored account key.
pub fn sign_tx_with_account(
    data_dir: &Path,
    tx: Tx,
    account: &Address,
    password: &str,
) -> Result<SignedTx, KeystoreError> {
    let keypair = unlock_account(data_dir, account, password)?;
    sign_tx(tx, &keypair).map_err(|_| KeystoreError::Malformed(*account))
}

/// List every address with a key file in the data directory.
pub fn list_accounts(data_dir: &Path) -> Result<Vec<Address>, KeystoreError> {
    let dir = keystore_dir(data_dir);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut accounts = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Ok(address) = stem.parse() {
            accounts.push(address);
        }
    }
    accounts.sort();
    Ok(accounts)
}

// ---------------------------------------------------------------------------
// Sealing
// ---------------------------------------------------------------------------

/// Derive the 32-byte AEAD key from a password and salt.
fn derive_key(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    *hasher.finalize().as_bytes()
}

/// AES-256-GCM encrypt with a random nonce; output is `nonce || ct`.
fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
    let cipher = Aes256Gcm::new_from_slice(key).expect("32-byte key");

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher.encrypt(nonce, plaintext)?;

    let mut out = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Inverse of [`seal`].
fn open(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
    if sealed.len() < NONCE_LENGTH {
        return Err(aes_gcm::Error);
    }
    let cipher = Aes256Gcm::new_from_slice(key).expect("32-byte key");
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);
    cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "security123";

    #[test]
    fn create_unlock_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let address = new_account(dir.path(), PASSWORD).unwrap();

        let keypair = unlock_account(dir.path(), &address, PASSWORD).unwrap();
        assert_eq!(keypair.address(), address);
    }

    #[test]
    fn wrong_password_fails() {
        let dir = tempfile::tempdir().unwrap();
        let address = new_account(dir.path(), PASSWORD).unwrap();

        let err = unlock_account(dir.path(), &address, "letmein").unwrap_err();
        assert!(matches!(err, KeystoreError::UnlockFailed(_)));
    }

    #[test]
    fn unknown_account_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ghost = Address::from_bytes([0xaa; 20]);
        let err = unlock_account(dir.path(), &ghost, PASSWORD).unwrap_err();
        assert!(matches!(err, KeystoreError::UnknownAccount(_)));
    }

    #[test]
    fn signed_tx_from_keystore_is_authentic() {
        let dir = tempfile::tempdir().unwrap();
        let address = new_account(dir.path(), PASSWORD).unwrap();

        let tx = Tx::new(address, Address::from_bytes([2; 20]), 10, 1, "");
        let signed = sign_tx_with_account(dir.path(), tx, &address, PASSWORD).unwrap();
        assert!(signed.is_authentic());
        assert_eq!(signed.tx.from, address);
    }

    #[test]
    fn list_accounts_sees_created_keys() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_accounts(dir.path()).unwrap().is_empty());

        let a = new_account(dir.path(), PASSWORD).unwrap();
        let b = new_account(dir.path(), PASSWORD).unwrap();

        let accounts = list_accounts(dir.path()).unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.contains(&a));
        assert!(accounts.contains(&b));
    }

    #[test]
    fn distinct_accounts_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let a = new_account(dir.path(), PASSWORD).unwrap();
        let b = new_account(dir.path(), PASSWORD).unwrap();
        assert_ne!(a, b);
    }
}
