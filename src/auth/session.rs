//! Shared in-memory authentication state.

use tokio::sync::{Mutex, MutexGuard};

/// Token pair held by an [`AuthSession`].
#[derive(Debug, Default)]
pub(crate) struct SessionTokens {
    pub(crate) id_token: Option<String>,
    pub(crate) refresh_token: Option<String>,
}

/// Process-wide token state for one pipeline run.
///
/// The id token only ever lives here; the refresh token is additionally
/// persisted through the credential store. The async mutex doubles as the
/// serialization point for authentication: whoever holds it is the only one
/// allowed to talk to the identity provider.
#[derive(Debug, Default)]
pub struct AuthSession {
    tokens: Mutex<SessionTokens>,
}

impl AuthSession {
    /// Creates an empty, unauthenticated session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current id token, if authenticated.
    pub async fn id_token(&self) -> Option<String> {
        self.tokens.lock().await.id_token.clone()
    }

    /// Returns the refresh token obtained in this run, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens.lock().await.refresh_token.clone()
    }

    /// Returns true once an id token is present.
    pub async fn is_authenticated(&self) -> bool {
        self.tokens.lock().await.id_token.is_some()
    }

    /// Drops both tokens from memory.
    pub async fn clear(&self) {
        let mut tokens = self.tokens.lock().await;
        tokens.id_token = None;
        tokens.refresh_token = None;
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionTokens> {
        self.tokens.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_is_unauthenticated() {
        let session = AuthSession::new();
        assert!(!session.is_authenticated().await);
        assert!(session.id_token().await.is_none());
        assert!(session.refresh_token().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_drops_tokens() {
        let session = AuthSession::new();
        {
            let mut tokens = session.lock().await;
            tokens.id_token = Some("id".to_string());
            tokens.refresh_token = Some("refresh".to_string());
        }
        assert!(session.is_authenticated().await);

        session.clear().await;
        assert!(!session.is_authenticated().await);
        assert!(session.refresh_token().await.is_none());
    }
}
