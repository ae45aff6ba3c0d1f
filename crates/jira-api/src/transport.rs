// Shared transport configuration for building reqwest::Client instances.
//
// One client is built per session; the timeout is fixed and not
// configurable per call. Retry is a caller concern, never done here.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

/// Fixed per-request deadline, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// JSON `Accept`/`Content-Type` are installed as default headers; the
    /// `Authorization` header is attached per request by the session.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("jira-api/0.1.0")
            .default_headers(headers)
            .build()
            .map_err(|e| crate::error::Error::Network(format!("failed to build HTTP client: {e}")))
    }
}
