//! Shared HTTP client construction policy and the `reqwest` transport.
//!
//! Every request the pipeline makes (listing pages, detail pages, the content
//! API, manifests and the identity provider) goes through a client built here,
//! so timeout, user-agent, compression and proxy handling stay consistent.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::{debug, warn};
use url::Url;

use crate::user_agent;

use super::{Transport, TransportError};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Explicit proxy applied to every request of a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy URL, e.g. `http://proxy.local:3128` or `socks5://127.0.0.1:1080`.
    pub url: String,
}

impl ProxyConfig {
    /// Creates a proxy configuration for the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Construction options for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Optional explicit proxy (otherwise system/env proxies apply).
    pub proxy: Option<ProxyConfig>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            proxy: None,
        }
    }
}

/// `reqwest`-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with default timeouts and no explicit proxy.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] when client construction fails.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_options(&TransportOptions::default())
    }

    /// Creates a transport from explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] when the proxy URL is invalid or
    /// client construction fails.
    pub fn with_options(options: &TransportOptions) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_http_client(options)?,
        })
    }

    /// Returns the underlying client so other components can share its policy.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, headers), fields(url = %url))]
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, TransportError> {
        let parsed = Url::parse(url).map_err(|_| TransportError::invalid_url(url))?;

        let mut request = self.client.get(parsed);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|source| TransportError::network(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|source| TransportError::network(url, source))?;
        debug!(bytes = body.len(), "Fetched");
        Ok(body)
    }
}

/// Builds an HTTP client using shared project policy.
///
/// # Errors
///
/// Returns [`TransportError::ClientBuild`] when the proxy URL is invalid or
/// client construction fails.
pub fn build_http_client(options: &TransportOptions) -> Result<Client, TransportError> {
    match try_build_client(options, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some restricted sandbox environments panic when querying system
            // proxy settings. The fallback keeps env-proxy support while
            // bypassing the system lookup.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(options, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(TransportError::client_build(
                    "HTTP client construction panicked while initializing networking",
                )),
                Err(BuildClientFailure::Build(reason)) => {
                    Err(TransportError::client_build(reason))
                }
            }
        }
        Err(BuildClientFailure::Build(reason)) => Err(TransportError::client_build(reason)),
    }
}

enum BuildClientFailure {
    Panic,
    Build(String),
}

fn try_build_client(
    options: &TransportOptions,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(options);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        if let Some(proxy) = &options.proxy {
            let resolved = Proxy::all(&proxy.url)
                .map_err(|error| BuildClientFailure::Build(format!("invalid proxy: {error}")))?;
            builder = builder.proxy(resolved);
        }
        builder
            .build()
            .map_err(|error| BuildClientFailure::Build(error.to_string()))
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(options: &TransportOptions) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(options.connect_timeout_secs))
        .timeout(Duration::from_secs(options.read_timeout_secs))
        .user_agent(user_agent::default_user_agent())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
