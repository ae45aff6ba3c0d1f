// Client facade: session lifecycle, transport verbs, cached reads.
//
// Resource operations (boards, sprints, issues, comments, users, meta,
// attachments) are implemented as inherent methods in separate files to keep
// this module focused on transport mechanics and session state.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{CacheClass, ResponseCache, cache_key};
use crate::config::JiraConfig;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::Supplemental;

/// Which REST namespace a path lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Namespace {
    /// Agile boards/sprints: `/rest/agile/1.0/`.
    Agile,
    /// Platform issue tracking: `/rest/api/3/`.
    Api,
}

impl Namespace {
    fn prefix(self) -> &'static str {
        match self {
            Self::Agile => "rest/agile/1.0/",
            Self::Api => "rest/api/3/",
        }
    }
}

/// Error response shape from the Platform/Agile APIs.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "errorMessages")]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: serde_json::Map<String, Value>,
}

/// One active session: transport + endpoint + derived auth header.
///
/// Immutable once built; re-`initialize` swaps in a whole new session and
/// cancels the old one's token.
pub(crate) struct Session {
    http: reqwest::Client,
    base_url: Url,
    authorization: HeaderValue,
    cancel: CancellationToken,
}

impl Session {
    fn url(&self, ns: Namespace, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(ns.prefix())?.join(path)?)
    }

    /// Send a request with auth attached and consume its body, racing the
    /// whole exchange against the session's cancellation token. `send` only
    /// resolves once response headers arrive, so the body download is raced
    /// too; a cancelled session surfaces as [`Error::Cancelled`], never as
    /// stale data.
    async fn execute<T>(
        &self,
        req: reqwest::RequestBuilder,
        consume: impl AsyncFnOnce(reqwest::Response) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let authorized = req.header(AUTHORIZATION, self.authorization.clone());
        let exchange = async move {
            let resp = authorized.send().await?;
            consume(resp).await
        };
        tokio::select! {
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            out = exchange => out,
        }
    }

    pub(crate) async fn get_json(
        &self,
        ns: Namespace,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, Error> {
        let url = self.url(ns, path)?;
        debug!("GET {url} params={params:?}");
        self.execute(self.http.get(url).query(params), handle_json)
            .await
    }

    pub(crate) async fn post_json(
        &self,
        ns: Namespace,
        path: &str,
        body: &Value,
    ) -> Result<Value, Error> {
        let url = self.url(ns, path)?;
        debug!("POST {url}");
        self.execute(self.http.post(url).json(body), handle_json)
            .await
    }

    pub(crate) async fn put_json(
        &self,
        ns: Namespace,
        path: &str,
        body: &Value,
    ) -> Result<Value, Error> {
        let url = self.url(ns, path)?;
        debug!("PUT {url}");
        self.execute(self.http.put(url).json(body), handle_json)
            .await
    }

    pub(crate) async fn delete(&self, ns: Namespace, path: &str) -> Result<(), Error> {
        let url = self.url(ns, path)?;
        debug!("DELETE {url}");
        self.execute(self.http.delete(url), handle_empty).await
    }

    /// Authenticated GET of an absolute URL, returning the raw body bytes.
    /// Used for attachment downloads, which live outside the REST namespaces.
    pub(crate) async fn get_bytes(&self, absolute_url: &str) -> Result<Vec<u8>, Error> {
        let url = Url::parse(absolute_url)?;
        debug!("GET {url} (binary)");
        self.execute(self.http.get(url), handle_bytes).await
    }
}

async fn handle_json(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await.map_err(Error::from)?;
        if body.is_empty() {
            // 204s and empty 200s (assign, transition, delete) are fine.
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization(format!("{e} (body preview: {preview:?})"))
        })
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_bytes(resp: reqwest::Response) -> Result<Vec<u8>, Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp.bytes().await.map_err(Error::from)?.to_vec())
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

/// Normalize a non-2xx response into [`Error::Http`], carrying the backend's
/// message list when the body parses as the standard error envelope.
async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    let mut messages = Vec::new();
    if let Ok(body) = serde_json::from_str::<ErrorBody>(&raw) {
        messages.extend(body.error_messages);
        for (field, detail) in body.errors {
            match detail {
                Value::String(s) => messages.push(format!("{field}: {s}")),
                other => messages.push(format!("{field}: {other}")),
            }
        }
    }

    Error::Http {
        status: status.as_u16(),
        messages,
    }
}

/// Async client for the Jira Cloud REST API.
///
/// Owns all shared mutable state: the swappable session, the response cache,
/// and the pending-request map. Construct one per logical connection (or per
/// test); there is no process-wide singleton.
pub struct JiraClient {
    session: ArcSwapOption<Session>,
    cache: ResponseCache,
}

impl Default for JiraClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JiraClient {
    /// A client with no active session. Every resource operation fails with
    /// [`Error::NotInitialized`] until [`initialize`](Self::initialize).
    pub fn new() -> Self {
        Self {
            session: ArcSwapOption::empty(),
            cache: ResponseCache::new(),
        }
    }

    /// Build the transport and activate a session.
    ///
    /// Callable repeatedly -- re-initializing replaces the prior session,
    /// cancels its outstanding requests, and clears the cache so no data
    /// from a previous account can leak into the new session.
    pub fn initialize(&self, config: &JiraConfig) -> Result<(), Error> {
        let http = TransportConfig::default().build_client()?;

        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let raw = format!("{}:{}", config.email, config.api_token.expose_secret());
        let mut authorization = HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(raw)))
            .map_err(|e| Error::Network(format!("invalid authorization header: {e}")))?;
        authorization.set_sensitive(true);

        let session = Session {
            http,
            base_url,
            authorization,
            cancel: CancellationToken::new(),
        };
        if let Some(old) = self.session.swap(Some(Arc::new(session))) {
            old.cancel.cancel();
        }
        self.cache.clear();
        Ok(())
    }

    /// Drop the session, cancel outstanding requests (best-effort -- the
    /// remote side may still process them), and clear all cache bookkeeping.
    pub fn reset(&self) {
        if let Some(old) = self.session.swap(None) {
            old.cancel.cancel();
        }
        self.cache.clear();
    }

    /// Abort all in-flight requests without dropping the session.
    ///
    /// Waiters observe [`Error::Cancelled`]; subsequent calls go through
    /// normally under a fresh cancellation token.
    pub fn cancel_pending_requests(&self) {
        if let Some(old) = self.session.load_full() {
            old.cancel.cancel();
            let fresh = Session {
                http: old.http.clone(),
                base_url: old.base_url.clone(),
                authorization: old.authorization.clone(),
                cancel: CancellationToken::new(),
            };
            self.session.store(Some(Arc::new(fresh)));
        }
        self.cache.clear_pending();
    }

    /// Probe the configured endpoint and credential.
    pub async fn test_connection(&self) -> bool {
        match self.get_current_user().await {
            Ok(_) => true,
            Err(e) => {
                debug!("connection test failed: {e}");
                false
            }
        }
    }

    pub(crate) fn session(&self) -> Result<Arc<Session>, Error> {
        self.session.load_full().ok_or(Error::NotInitialized)
    }

    /// Cached-read path: consult the cache, then the in-flight map, then the
    /// transport. Uncached classes skip the engine and hit transport directly.
    pub(crate) async fn cached_get(
        &self,
        ns: Namespace,
        path: &str,
        params: &[(&str, String)],
        class: CacheClass,
    ) -> Result<Arc<Value>, Error> {
        let session = self.session()?;

        let Some(ttl) = class.ttl() else {
            return session.get_json(ns, path, params).await.map(Arc::new);
        };

        let key = cache_key(path, params);
        let owned_path = path.to_owned();
        let owned_params: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();

        self.cache
            .fetch(key, ttl, async move {
                let params: Vec<(&str, String)> = owned_params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.clone()))
                    .collect();
                session.get_json(ns, &owned_path, &params).await
            })
            .await
    }

    // ── Mutation -> invalidation table ───────────────────────────────

    /// An issue changed: purge its detail and every board list, since board
    /// views embed summarized issue fields.
    pub(crate) fn invalidate_issue(&self, issue_key: &str) {
        let issue_prefix = format!("issue/{issue_key}");
        self.cache.invalidate_prefixes(&[&issue_prefix, "board"]);
    }

    /// An issue was created: board lists may now include it.
    pub(crate) fn invalidate_boards(&self) {
        self.cache.invalidate_prefixes(&["board"]);
    }

    /// Sprint membership or state changed: purge sprint and board caches.
    pub(crate) fn invalidate_sprints(&self) {
        self.cache.invalidate_prefixes(&["sprint", "board"]);
    }
}

/// Collapse a supplementary read into [`Supplemental`]: HTTP and transport
/// failures are logged and degrade to the default value; `NotInitialized`
/// still propagates because no session means no fallback either.
pub(crate) fn degrade<T: Default>(
    context: &str,
    result: Result<T, Error>,
) -> Result<Supplemental<T>, Error> {
    match result {
        Ok(data) => Ok(Supplemental::loaded(data)),
        Err(Error::NotInitialized) => Err(Error::NotInitialized),
        Err(e) => {
            warn!("{context} fetch degraded to empty: {e}");
            Ok(Supplemental::unavailable())
        }
    }
}
