//! Encrypted-at-rest credential vault.
//!
//! The vault holds the account username, password and the refresh token as a
//! small JSON map, sealed with XChaCha20-Poly1305 and written to
//! `$XDG_CONFIG_HOME/vier/vault.enc`. The key material comes from
//! `VIER_MASTER_KEY` when set, otherwise from the system keychain.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{CredentialStore, StoreError};
use crate::config::default_config_dir;

const VAULT_FILE_NAME: &str = "vault.enc";
const MASTER_KEY_ENV: &str = "VIER_MASTER_KEY";
const KEYRING_SERVICE: &str = "vier";
const KEYRING_ENTRY_NAME: &str = "vault-master-key-v1";
const MAGIC: &[u8; 4] = b"VRV1";
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;

/// Returns the default vault path (`~/.config/vier/vault.enc`).
///
/// # Errors
///
/// Returns [`StoreError::ConfigDirUnavailable`] if no usable config dir is found.
pub fn default_vault_path() -> Result<PathBuf, StoreError> {
    default_config_dir()
        .map(|dir| dir.join(VAULT_FILE_NAME))
        .ok_or(StoreError::ConfigDirUnavailable)
}

/// File-backed [`CredentialStore`] that re-encrypts the whole map on every write.
#[derive(Debug)]
pub struct EncryptedVault {
    path: PathBuf,
    key_material: String,
    entries: RwLock<BTreeMap<String, String>>,
}

impl EncryptedVault {
    /// Opens the vault at the default location using the env/keychain key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the key cannot be obtained or an existing
    /// vault cannot be decrypted.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = default_vault_path()?;
        let key = load_or_create_key()?;
        Self::open(path, key)
    }

    /// Opens (or prepares to create) the vault at `path` with explicit key material.
    ///
    /// A missing file yields an empty vault; nothing is written until the first `set`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when an existing file is unreadable, malformed,
    /// or was sealed with a different key.
    pub fn open(
        path: impl Into<PathBuf>,
        key_material: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let key_material = key_material.into();
        let entries = if path.exists() {
            let bytes = fs::read(&path)?;
            let plaintext = decrypt_bytes(&bytes, &key_material)?;
            serde_json::from_slice::<BTreeMap<String, String>>(&plaintext)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "credential vault opened");

        Ok(Self {
            path,
            key_material,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the on-disk location of the vault.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the vault at the default location without decrypting it.
    ///
    /// Returns `true` when the file existed and was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the path cannot be resolved or removal fails.
    pub fn clear_default() -> Result<bool, StoreError> {
        Self::clear(&default_vault_path()?)
    }

    /// Deletes the vault file at `path` and best-effort clears the keychain key.
    ///
    /// Returns `true` when the file existed and was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when file removal fails.
    pub fn clear(path: &Path) -> Result<bool, StoreError> {
        let removed = remove_vault_file(path)?;
        if env::var_os(MASTER_KEY_ENV).is_none() {
            let _ = delete_keychain_key();
        }

        Ok(removed)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(entries)?;
        let encrypted = encrypt_bytes(&plaintext, &self.key_material)?;
        write_encrypted_payload(&self.path, &encrypted)
    }
}

impl CredentialStore for EncryptedVault {
    fn get(&self, key: &str) -> Option<String> {
        match self.entries.read() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => {
                warn!(key, "credential vault lock poisoned; treating entry as missing");
                None
            }
        }
    }

    // The in-memory map only changes after the encrypted file was written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *entries = updated;
        Ok(true)
    }
}

fn remove_vault_file(path: &Path) -> Result<bool, StoreError> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path)?;
    Ok(true)
}

fn load_or_create_key() -> Result<String, StoreError> {
    if let Some(from_env) = env::var_os(MASTER_KEY_ENV) {
        let key = from_env.to_string_lossy().trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let entry = safe_keyring_entry()?;

    match safe_keyring_get_password(&entry) {
        Ok(existing) if !existing.trim().is_empty() => Ok(existing),
        _ => {
            let generated = generate_key_material();
            safe_keyring_set_password(&entry, &generated)?;
            Ok(generated)
        }
    }
}

fn delete_keychain_key() -> Result<(), StoreError> {
    let entry = safe_keyring_entry()?;
    catch_unwind(AssertUnwindSafe(|| entry.delete_credential()))
        .map_err(|_| StoreError::KeychainUnavailable)?
        .map_err(|_| StoreError::KeychainUnavailable)
}

// keyring backends may panic when no secret service is reachable.
fn safe_keyring_entry() -> Result<keyring::Entry, StoreError> {
    catch_unwind(|| keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY_NAME))
        .map_err(|_| StoreError::KeychainUnavailable)?
        .map_err(|_| StoreError::KeychainUnavailable)
}

fn safe_keyring_get_password(entry: &keyring::Entry) -> Result<String, StoreError> {
    catch_unwind(AssertUnwindSafe(|| entry.get_password()))
        .map_err(|_| StoreError::KeychainUnavailable)?
        .map_err(|_| StoreError::KeychainUnavailable)
}

fn safe_keyring_set_password(entry: &keyring::Entry, password: &str) -> Result<(), StoreError> {
    catch_unwind(AssertUnwindSafe(|| entry.set_password(password)))
        .map_err(|_| StoreError::KeychainUnavailable)?
        .map_err(|_| StoreError::KeychainUnavailable)
}

fn generate_key_material() -> String {
    let mut bytes = [0_u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn derive_key_bytes(key_material: &str) -> [u8; KEY_LEN] {
    let digest = Sha256::digest(key_material.as_bytes());
    let mut key = [0_u8; KEY_LEN];
    key.copy_from_slice(&digest[..KEY_LEN]);
    key
}

fn write_encrypted_payload(path: &Path, payload: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, payload)?;
    set_owner_only_permissions(path)
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

fn encrypt_bytes(plaintext: &[u8], key_material: &str) -> Result<Vec<u8>, StoreError> {
    let key_bytes = derive_key_bytes(key_material);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key_bytes));

    let mut nonce = [0_u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| StoreError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(MAGIC.len() + NONCE_LEN + ciphertext.len());
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn decrypt_bytes(payload: &[u8], key_material: &str) -> Result<Vec<u8>, StoreError> {
    if payload.len() < MAGIC.len() + NONCE_LEN || &payload[..MAGIC.len()] != MAGIC {
        return Err(StoreError::InvalidPayload);
    }

    let key_bytes = derive_key_bytes(key_material);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key_bytes));
    let nonce_end = MAGIC.len() + NONCE_LEN;
    let nonce = XNonce::from_slice(&payload[MAGIC.len()..nonce_end]);

    cipher
        .decrypt(nonce, &payload[nonce_end..])
        .map_err(|_| StoreError::DecryptionFailed)
}
