//! CLI command handlers.

mod auth;
mod list;
mod resolve;

pub use auth::{run_auth_clear_command, run_auth_login_command};
pub use list::run_list_command;
pub use resolve::run_resolve_command;

use std::sync::Arc;

use tracing::warn;
use vier_core::{CredentialStore, EncryptedVault, MemoryCredentialStore};

/// Opens the credential vault, degrading to an empty in-memory store.
///
/// Listing and direct-manifest videos never need credentials, so an
/// unavailable keychain only matters once a restricted video is resolved.
pub(crate) fn open_credential_store() -> Arc<dyn CredentialStore> {
    match EncryptedVault::open_default() {
        Ok(vault) => Arc::new(vault),
        Err(error) => {
            warn!(%error, "credential vault unavailable; restricted videos will not resolve");
            Arc::new(MemoryCredentialStore::new())
        }
    }
}
