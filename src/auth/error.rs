//! Error types for authentication and credential storage.

use thiserror::Error;

/// Errors from the token lifecycle.
///
/// All variants are terminal for the current operation; nothing is retried
/// internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username or password is not stored.
    #[error(
        "no credentials stored for VIER/VIJF/ZES\n  Suggestion: run `vier auth login` to store your username and password"
    )]
    MissingCredentials,

    /// The identity provider rejected the stored username/password.
    #[error(
        "the identity provider rejected the stored credentials\n  Suggestion: check your password and run `vier auth login` again"
    )]
    InvalidCredentials,

    /// The refresh token could not be exchanged for a new id token.
    #[error("token renewal failed: {reason}")]
    RenewalFailed {
        /// Why renewal failed.
        reason: String,
    },
}

impl AuthError {
    /// Creates a `RenewalFailed` error.
    #[must_use]
    pub fn renewal_failed(reason: impl Into<String>) -> Self {
        Self::RenewalFailed {
            reason: reason.into(),
        }
    }
}

/// Errors for the encrypted credential vault.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Could not access keychain and no env fallback key was provided.
    #[error(
        "unable to access system keychain for the vault encryption key; set VIER_MASTER_KEY or configure keychain access"
    )]
    KeychainUnavailable,
    /// Stored encrypted payload is malformed.
    #[error("credential vault payload is invalid")]
    InvalidPayload,
    /// Encryption failed.
    #[error("failed to encrypt credential vault")]
    EncryptionFailed,
    /// Decryption failed.
    #[error("failed to decrypt credential vault (wrong key?)")]
    DecryptionFailed,
    /// In-memory state was poisoned by a panicking writer.
    #[error("credential store lock poisoned")]
    LockPoisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_suggests_login() {
        let msg = AuthError::MissingCredentials.to_string();
        assert!(msg.contains("vier auth login"));
    }

    #[test]
    fn test_renewal_failed_contains_reason() {
        let err = AuthError::renewal_failed("no stored refresh token");
        assert!(err.to_string().contains("no stored refresh token"));
    }

    #[test]
    fn test_keychain_unavailable_mentions_env_fallback() {
        assert!(
            StoreError::KeychainUnavailable
                .to_string()
                .contains("VIER_MASTER_KEY")
        );
    }
}
