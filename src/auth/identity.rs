//! Identity provider seam and the AWS Cognito implementation.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Cognito user pool of the VIER/VIJF/ZES accounts.
pub const DEFAULT_USER_POOL_ID: &str = "eu-west-1_dViSsKM5Y";
/// Cognito app client used by the broadcaster's web player.
pub const DEFAULT_CLIENT_ID: &str = "6s1h851s8uplco5h6mqh1jac8m";

const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const AMZ_JSON: &str = "application/x-amz-json-1.1";
const FALLBACK_REGION: &str = "eu-west-1";

/// Exchanges credentials or refresh tokens for an id token.
///
/// Implementations report rejection as `None`; the reason is theirs to log.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges a refresh token for a fresh id token.
    async fn renew(&self, refresh_token: &str) -> Option<String>;

    /// Logs in with username/password, returning `(id_token, refresh_token)`.
    async fn authenticate(&self, username: &str, password: &str) -> Option<(String, String)>;
}

/// [`IdentityProvider`] speaking Cognito's `InitiateAuth` JSON protocol.
#[derive(Debug, Clone)]
pub struct CognitoIdentityClient {
    client: Client,
    user_pool_id: String,
    client_id: String,
    endpoint: String,
}

impl CognitoIdentityClient {
    /// Creates a client for the given pool; the region is taken from the pool id prefix.
    #[must_use]
    pub fn new(client: Client, user_pool_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        let user_pool_id = user_pool_id.into();
        let endpoint = format!(
            "https://cognito-idp.{}.amazonaws.com/",
            region_of_pool(&user_pool_id)
        );
        Self {
            client,
            user_pool_id,
            client_id: client_id.into(),
            endpoint,
        }
    }

    /// Points the client at a different endpoint (used against mock servers).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Returns the configured user pool id.
    #[must_use]
    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    /// Returns the endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn initiate_auth(
        &self,
        flow: &'static str,
        parameters: AuthParameters<'_>,
    ) -> Option<AuthenticationResult> {
        let request = InitiateAuthRequest {
            auth_flow: flow,
            client_id: &self.client_id,
            auth_parameters: parameters,
        };
        let body = match serde_json::to_vec(&request) {
            Ok(body) => body,
            Err(error) => {
                warn!(%error, "failed to encode InitiateAuth request");
                return None;
            }
        };

        let response = match self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", INITIATE_AUTH_TARGET)
            .header(CONTENT_TYPE, AMZ_JSON)
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                warn!(flow, %error, "identity provider unreachable");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<CognitoFault>()
                .await
                .ok()
                .map(CognitoFault::describe)
                .unwrap_or_default();
            info!(flow, status = status.as_u16(), %detail, "identity provider rejected request");
            return None;
        }

        match response.json::<InitiateAuthResponse>().await {
            Ok(parsed) => parsed.authentication_result,
            Err(error) => {
                warn!(flow, %error, "identity provider returned an unreadable response");
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityClient {
    #[tracing::instrument(skip_all, fields(pool = %self.user_pool_id))]
    async fn renew(&self, refresh_token: &str) -> Option<String> {
        let result = self
            .initiate_auth("REFRESH_TOKEN_AUTH", AuthParameters::Refresh { refresh_token })
            .await?;
        debug!("refresh token exchanged");
        result.id_token
    }

    #[tracing::instrument(skip_all, fields(pool = %self.user_pool_id))]
    async fn authenticate(&self, username: &str, password: &str) -> Option<(String, String)> {
        let result = self
            .initiate_auth(
                "USER_PASSWORD_AUTH",
                AuthParameters::Password { username, password },
            )
            .await?;
        match (result.id_token, result.refresh_token) {
            (Some(id_token), Some(refresh_token)) => Some((id_token, refresh_token)),
            _ => {
                warn!("login response is missing IdToken or RefreshToken");
                None
            }
        }
    }
}

/// Pool ids look like `<region>_<id>`.
fn region_of_pool(user_pool_id: &str) -> &str {
    match user_pool_id.split_once('_') {
        Some((region, _)) if !region.is_empty() => region,
        _ => FALLBACK_REGION,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'static str,
    client_id: &'a str,
    auth_parameters: AuthParameters<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum AuthParameters<'a> {
    Refresh {
        #[serde(rename = "REFRESH_TOKEN")]
        refresh_token: &'a str,
    },
    Password {
        #[serde(rename = "USERNAME")]
        username: &'a str,
        #[serde(rename = "PASSWORD")]
        password: &'a str,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct CognitoFault {
    #[serde(rename = "__type")]
    kind: Option<String>,
    message: Option<String>,
}

impl CognitoFault {
    fn describe(self) -> String {
        match (self.kind, self.message) {
            (Some(kind), Some(message)) => format!("{kind}: {message}"),
            (Some(kind), None) => kind,
            (None, Some(message)) => message,
            (None, None) => String::new(),
        }
    }
}
