//! Credential store seam and an in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use super::StoreError;

/// Key/value secret storage consumed by the token manager.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored value for `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`; returns whether a value was present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

/// Non-persistent [`CredentialStore`], used for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `entries`.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .entries
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .remove(key)
            .is_some())
    }
}
