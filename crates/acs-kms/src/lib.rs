//! # acs-kms
//!
//! A local stand-in for a managed key-management service.
//!
//! [`KeyManager`] mints one 256-bit data key per key id, caches it for the
//! process lifetime, and performs AES-256-GCM authenticated encryption with
//! a fresh random 96-bit nonce per call. The call shape (`get_key` /
//! `encrypt` / `decrypt` keyed by a string id) is the same one a real KMS
//! client would expose, so swapping this out does not touch callers.
//!
//! Decryption is the one place in the engine where an error is loud on
//! purpose: a rejected authentication tag surfaces as
//! [`AcsError::DecryptFailed`] and is never swallowed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use tracing::debug;

use acs_contracts::{AcsError, AcsResult};

/// Data-key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;
/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// GCM authentication-tag length in bytes.
pub const TAG_LEN: usize = 16;

/// A cached 256-bit data key.
///
/// `Debug` output never reveals the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct DataKey([u8; KEY_LEN]);

impl DataKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataKey").field(&"[REDACTED]").finish()
    }
}

/// The output of one [`KeyManager::encrypt`] call.
///
/// The three parts travel together: decryption needs the ciphertext, the
/// nonce it was sealed under, and the authentication tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
}

/// Per-process key manager with a lazily populated key cache.
#[derive(Default)]
pub struct KeyManager {
    keys: Mutex<HashMap<String, DataKey>>,
}

impl KeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the data key for `key_id`, minting it on first use.
    ///
    /// Lookup and generation run under one lock, so two concurrent callers
    /// can never end up holding different keys for the same id.
    pub fn get_key(&self, key_id: &str) -> AcsResult<DataKey> {
        let mut keys = self.keys.lock().map_err(|e| AcsError::Crypto {
            reason: format!("key cache lock poisoned: {e}"),
        })?;
        if let Some(key) = keys.get(key_id) {
            return Ok(key.clone());
        }

        let generated = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(generated.as_slice());
        let key = DataKey(bytes);
        keys.insert(key_id.to_string(), key.clone());
        debug!(key_id, "minted new data key");
        Ok(key)
    }

    /// Seals `plaintext` under the key for `key_id` with a fresh nonce.
    pub fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> AcsResult<Ciphertext> {
        let key = self.get_key(key_id)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let mut sealed = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| AcsError::Crypto {
                reason: format!("encryption failed for key `{key_id}`"),
            })?;

        // aes-gcm appends the 16-byte tag to the ciphertext; callers carry
        // the two parts separately.
        let split = sealed.len() - TAG_LEN;
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&sealed[split..]);
        sealed.truncate(split);

        let mut iv = [0u8; NONCE_LEN];
        iv.copy_from_slice(nonce.as_slice());

        Ok(Ciphertext {
            ciphertext: sealed,
            iv,
            tag,
        })
    }

    /// Opens a ciphertext sealed by [`KeyManager::encrypt`].
    ///
    /// Fails with [`AcsError::DecryptFailed`] when the tag does not verify,
    /// whether the cause is a tampered ciphertext, a wrong nonce, or a
    /// different key.
    pub fn decrypt(
        &self,
        key_id: &str,
        ciphertext: &[u8],
        iv: &[u8; NONCE_LEN],
        tag: &[u8; TAG_LEN],
    ) -> AcsResult<Vec<u8>> {
        let key = self.get_key(key_id)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        cipher
            .decrypt(Nonce::from_slice(iv), sealed.as_slice())
            .map_err(|_| AcsError::DecryptFailed {
                key_id: key_id.to_string(),
            })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
