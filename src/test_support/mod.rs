//! In-memory doubles for the pipeline seams, shared by unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{CredentialStore, IdentityProvider, Notice, Notifier, StoreError};
use crate::stream::{ManifestParser, ManifestStream};
use crate::transport::{Transport, TransportError};

/// A request seen by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Serves canned bodies by exact URL; unknown URLs answer 404.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    routes: HashMap<String, Result<String, u16>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub(crate) fn with_status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_string(), Err(status));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.url).collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
        });
        match self.routes.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(TransportError::http_status(url, *status)),
            None => Err(TransportError::http_status(url, 404)),
        }
    }
}

/// Identity provider with scripted answers and call counters.
#[derive(Debug, Default)]
pub(crate) struct FakeIdentity {
    login: Option<(String, String)>,
    renewal: Option<String>,
    delay: Option<Duration>,
    authenticate_calls: AtomicUsize,
    renew_calls: AtomicUsize,
}

impl FakeIdentity {
    pub(crate) fn accepting(id_token: &str, refresh_token: &str) -> Self {
        Self {
            login: Some((id_token.to_string(), refresh_token.to_string())),
            ..Self::default()
        }
    }

    pub(crate) fn rejecting() -> Self {
        Self::default()
    }

    pub(crate) fn with_renewal(mut self, id_token: &str) -> Self {
        self.renewal = Some(id_token.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn renew_calls(&self) -> usize {
        self.renew_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn renew(&self, _refresh_token: &str) -> Option<String> {
        self.renew_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.renewal.clone()
    }

    async fn authenticate(&self, _username: &str, _password: &str) -> Option<(String, String)> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.login.clone()
    }
}

/// Credential store that reads normally but refuses every write.
#[derive(Debug, Default)]
pub(crate) struct FailingCredentialStore {
    entries: HashMap<String, String>,
}

impl FailingCredentialStore {
    pub(crate) fn with_entries<const N: usize>(entries: [(&str, &str); N]) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl CredentialStore for FailingCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("read-only store")))
    }

    fn remove(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Io(std::io::Error::other("read-only store")))
    }
}

/// Notifier that remembers every notice.
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Manifest parser returning fixed streams per manifest URL.
#[derive(Debug, Default)]
pub(crate) struct FakeManifests {
    manifests: HashMap<String, Vec<ManifestStream>>,
    requests: Mutex<Vec<String>>,
}

impl FakeManifests {
    pub(crate) fn with_manifest(mut self, url: &str, streams: &[(&str, &str)]) -> Self {
        self.manifests.insert(
            url.to_string(),
            streams
                .iter()
                .map(|(locator, bitrate)| ManifestStream::new(*locator, *bitrate))
                .collect(),
        );
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManifestParser for FakeManifests {
    async fn streams_of(&self, manifest_url: &str) -> Result<Vec<ManifestStream>, TransportError> {
        self.requests.lock().unwrap().push(manifest_url.to_string());
        self.manifests
            .get(manifest_url)
            .cloned()
            .ok_or_else(|| TransportError::http_status(manifest_url, 404))
    }
}
