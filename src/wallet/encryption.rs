//! Value encryption for the secure store
//!
//! A 32-byte master key is derived from the master password with Argon2id.
//! Key names are hashed with HMAC-SHA256 under the master key so lookups stay
//! deterministic without storing names in clear. Values are sealed with
//! AES-256-GCM, bound to their hashed key name as associated data.

use crate::error::{Result, WalletError};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

pub const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Encrypted value with the nonce needed to open it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedValue {
    /// AES-256-GCM ciphertext (includes the 16-byte tag)
    pub ciphertext: Vec<u8>,
    /// Nonce for AES-GCM (12 bytes)
    pub nonce: Vec<u8>,
}

/// Master key for one store namespace
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; 32],
}

impl MasterKey {
    /// Derive the master key from a password and salt using Argon2id
    pub fn derive(password: &str, salt: &[u8]) -> Result<Self> {
        let mut bytes = [0u8; 32];
        Argon2::default()
            .hash_password_into(password.as_bytes(), salt, &mut bytes)
            .map_err(|e| WalletError::store(format!("failed to derive master key: {e}")))?;
        Ok(Self { bytes })
    }

    /// Fresh random salt for a new namespace
    pub fn generate_salt() -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        salt
    }

    /// Deterministic, opaque identifier for a key name
    pub fn key_id(&self, name: &str) -> String {
        // HMAC accepts keys of any length, so this cannot fail
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.bytes)
            .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
        mac.update(name.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Encrypt a value bound to `key_id`
    pub fn seal(&self, key_id: &str, plaintext: &str) -> Result<SealedValue> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|e| WalletError::store(format!("encryption failed: {e}")))?;

        Ok(SealedValue {
            ciphertext,
            nonce: nonce_bytes.to_vec(),
        })
    }

    /// Decrypt a value sealed under `key_id`
    pub fn open(&self, key_id: &str, sealed: &SealedValue) -> Result<String> {
        if sealed.nonce.len() != NONCE_LEN {
            return Err(WalletError::store("stored nonce has invalid length"));
        }

        let plaintext = self
            .cipher()
            .decrypt(
                Nonce::from_slice(&sealed.nonce),
                Payload {
                    msg: sealed.ciphertext.as_ref(),
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|_| WalletError::store("decryption failed - wrong master password or corrupted entry"))?;

        String::from_utf8(plaintext).map_err(|_| WalletError::store("invalid UTF-8 in decrypted value"))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.bytes))
    }
}
