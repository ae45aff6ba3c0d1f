use thiserror::Error;

/// Top-level error type for the `jira-api` crate.
///
/// Every variant is cheaply cloneable so that a single failed transport call
/// can fan out to all callers sharing the same deduplicated request. Transport
/// errors are therefore captured as strings rather than wrapping
/// `reqwest::Error` directly.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A resource operation was called before `initialize`.
    #[error("Client not initialized -- call initialize() first")]
    NotInitialized,

    /// Request exceeded the fixed per-request deadline.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Backend returned a non-2xx status. `messages` carries the backend's
    /// `errorMessages`/`errors` payload when one was present, for callers to
    /// surface verbatim.
    #[error("Jira API error (HTTP {status}): {}", .messages.first().map_or("no detail", String::as_str))]
    Http { status: u16, messages: Vec<String> },

    /// Transport-level failure (DNS, connection refused, reset, offline).
    #[error("HTTP transport error: {0}")]
    Network(String),

    /// URL parsing error (bad base URL or path join).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// 2xx response whose body failed to parse as JSON.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Request aborted by `reset` / `cancel_pending_requests`.
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// Returns `true` if the request exceeded its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The backend error-message list, if the failure carried one.
    pub fn backend_messages(&self) -> &[String] {
        match self {
            Self::Http { messages, .. } => messages,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                timeout_secs: crate::transport::REQUEST_TIMEOUT_SECS,
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}
