//! Authentication: token lifecycle, identity provider and credential storage.
//!
//! - [`TokenManager`] - Acquires, renews and caches the bearer token
//! - [`AuthSession`] - Shared in-memory token state for one run
//! - [`IdentityProvider`] / [`CognitoIdentityClient`] - Token exchange
//! - [`CredentialStore`] / [`EncryptedVault`] - Username, password and refresh token storage
//! - [`Notifier`] - User-facing notices (missing credentials)

mod credentials;
mod error;
mod identity;
mod notify;
mod session;
mod token;
mod vault;

pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use error::{AuthError, StoreError};
pub use identity::{
    CognitoIdentityClient, DEFAULT_CLIENT_ID, DEFAULT_USER_POOL_ID, IdentityProvider,
};
pub use notify::{LogNotifier, Notice, Notifier};
pub use session::AuthSession;
pub use token::TokenManager;
pub use vault::{EncryptedVault, default_vault_path};

/// Credential store key of the account username.
pub const USERNAME_KEY: &str = "viervijfzes_username";
/// Credential store key of the account password.
pub const PASSWORD_KEY: &str = "viervijfzes_password";
/// Credential store key of the persisted refresh token.
pub const REFRESH_TOKEN_KEY: &str = "viervijfzes_refresh_token";
