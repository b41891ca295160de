//! Configuration types for the OpenSearch backend.

use std::fmt;
use std::time::Duration;

/// Default request timeout for search engine calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Basic-auth credentials for the search engine.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for [`OpenSearchClient`](crate::OpenSearchClient).
#[derive(Debug, Clone)]
pub struct OpenSearchConfig {
    /// Server URL, e.g. `http://localhost:9200`.
    pub url: String,
    /// Destination index name.
    pub index_name: String,
    /// Optional basic-auth credentials.
    pub credentials: Option<BasicCredentials>,
    /// Validate TLS certificates. Disable only for development clusters.
    pub verify_certs: bool,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl OpenSearchConfig {
    /// Create a config for an unauthenticated cluster with default timeouts.
    pub fn new(url: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index_name: index_name.into(),
            credentials: None,
            verify_certs: true,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set basic-auth credentials.
    pub fn with_credentials(mut self, credentials: BasicCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Enable or disable TLS certificate validation.
    pub fn with_verify_certs(mut self, verify_certs: bool) -> Self {
        self.verify_certs = verify_certs;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
