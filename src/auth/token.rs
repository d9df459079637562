//! Token lifecycle: cached id token, refresh-token renewal, full login.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::session::SessionTokens;
use super::{
    AuthError, AuthSession, CredentialStore, IdentityProvider, LogNotifier, Notice, Notifier,
    PASSWORD_KEY, REFRESH_TOKEN_KEY, USERNAME_KEY,
};

/// Acquires and caches the bearer token used for restricted content lookups.
///
/// The manager never retries: a failed login is reported once and the caller
/// decides what to do next. Renewal failure silently falls back to login.
#[derive(Clone)]
pub struct TokenManager {
    session: Arc<AuthSession>,
    identity: Arc<dyn IdentityProvider>,
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Creates a manager that reports notices through the log.
    #[must_use]
    pub fn new(
        session: Arc<AuthSession>,
        identity: Arc<dyn IdentityProvider>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            session,
            identity,
            credentials,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Replaces the notifier used for user-facing notices.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Returns the shared session.
    #[must_use]
    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Returns the cached id token without triggering authentication.
    pub async fn id_token(&self) -> Option<String> {
        self.session.id_token().await
    }

    /// Makes sure an id token is available, renewing or logging in as needed.
    ///
    /// Concurrent callers are serialized on the session lock, so at most one
    /// exchange with the identity provider is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] when login is needed but no
    /// username/password is stored, and [`AuthError::InvalidCredentials`]
    /// when the identity provider rejects them.
    pub async fn ensure_authenticated(&self) -> Result<(), AuthError> {
        let mut tokens = self.session.lock().await;
        self.acquire(&mut tokens).await.map(|_| ())
    }

    /// Ensures authentication and returns the id token to send as `authorization`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_authenticated`].
    pub async fn authorization(&self) -> Result<String, AuthError> {
        let mut tokens = self.session.lock().await;
        self.acquire(&mut tokens).await
    }

    /// Attempts only the refresh-token renewal step.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RenewalFailed`] when no refresh token is stored or
    /// the identity provider does not accept it.
    pub async fn try_renew(&self) -> Result<(), AuthError> {
        let mut tokens = self.session.lock().await;
        self.renew(&mut tokens).await.map(|_| ())
    }

    /// Forgets the in-memory tokens. Stored credentials are left alone.
    pub async fn sign_out(&self) {
        self.session.clear().await;
        debug!("session cleared");
    }

    async fn acquire(&self, tokens: &mut SessionTokens) -> Result<String, AuthError> {
        if let Some(id_token) = &tokens.id_token {
            return Ok(id_token.clone());
        }

        match self.renew(tokens).await {
            Ok(id_token) => return Ok(id_token),
            Err(reason) => info!(%reason, "falling back to full login"),
        }

        self.login(tokens).await
    }

    #[tracing::instrument(skip_all)]
    async fn renew(&self, tokens: &mut SessionTokens) -> Result<String, AuthError> {
        let refresh_token = self
            .credentials
            .get(REFRESH_TOKEN_KEY)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AuthError::renewal_failed("no stored refresh token"))?;

        let id_token = self
            .identity
            .renew(&refresh_token)
            .await
            .ok_or_else(|| AuthError::renewal_failed("refresh token was not accepted"))?;

        info!("renewed id token from stored refresh token");
        tokens.id_token = Some(id_token.clone());
        tokens.refresh_token = Some(refresh_token);
        Ok(id_token)
    }

    #[tracing::instrument(skip_all)]
    async fn login(&self, tokens: &mut SessionTokens) -> Result<String, AuthError> {
        let username = self.stored(USERNAME_KEY);
        let password = self.stored(PASSWORD_KEY);
        let (Some(username), Some(password)) = (username, password) else {
            self.notifier.notify(Notice::MissingCredentials);
            return Err(AuthError::MissingCredentials);
        };

        let Some((id_token, refresh_token)) =
            self.identity.authenticate(&username, &password).await
        else {
            error!("login rejected by identity provider (wrong password?)");
            return Err(AuthError::InvalidCredentials);
        };

        if let Err(store_error) = self.credentials.set(REFRESH_TOKEN_KEY, &refresh_token) {
            warn!(error = %store_error, "could not persist refresh token");
        }

        info!("logged in");
        tokens.id_token = Some(id_token.clone());
        tokens.refresh_token = Some(refresh_token);
        Ok(id_token)
    }

    fn stored(&self, key: &str) -> Option<String> {
        self.credentials
            .get(key)
            .filter(|value| !value.trim().is_empty())
    }
}
