// Response cache + in-flight request deduplication.
//
// One mutex guards the entry map and the pending map together, so the
// check-cache / check-pending / register-pending sequence is atomic. The
// lock is never held across an await.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::Error;

/// Freshness class of a cached read. TTLs mirror how quickly each resource
/// goes stale in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheClass {
    /// Board listings and single boards: 5 minutes.
    BoardList,
    /// Issues within a board / sprint / backlog: 1 minute.
    BoardIssueList,
    /// Full issue detail: 2 minutes.
    IssueDetail,
    /// Issue types available in a project: 5 minutes.
    ProjectIssueTypes,
    /// Global priority list: 30 minutes.
    Priorities,
    /// Assignees derived from a board's issues: 5 minutes.
    BoardAssignees,
    /// Sprints attached to a board: 5 minutes.
    SprintsForBoard,
    /// Always fetched fresh (comments, links, transitions, current user).
    Uncached,
}

impl CacheClass {
    /// Time-to-live for this class, or `None` when the read bypasses the
    /// cache entirely.
    pub fn ttl(self) -> Option<Duration> {
        match self {
            Self::BoardList
            | Self::ProjectIssueTypes
            | Self::BoardAssignees
            | Self::SprintsForBoard => Some(Duration::from_secs(5 * 60)),
            Self::BoardIssueList => Some(Duration::from_secs(60)),
            Self::IssueDetail => Some(Duration::from_secs(2 * 60)),
            Self::Priorities => Some(Duration::from_secs(30 * 60)),
            Self::Uncached => None,
        }
    }
}

/// Build the canonical cache key for a path + query parameter set.
///
/// Pairs are sorted by name and form-urlencoded, so semantically identical
/// requests produce identical keys regardless of construction order, and a
/// value containing `&` or `=` cannot collide with a different parameter set.
pub fn cache_key(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_owned();
    }
    let mut pairs: Vec<&(&str, String)> = params.iter().collect();
    pairs.sort();
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        query.append_pair(k, v);
    }
    format!("{path}?{}", query.finish())
}

type FetchResult = Result<Arc<Value>, Error>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct CacheEntry {
    data: Arc<Value>,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    pending: HashMap<String, SharedFetch>,
    // Bumped by clear()/clear_pending(); a fetch registered under an older
    // generation must not write back into the maps when it settles.
    generation: u64,
}

/// TTL response cache with per-key in-flight deduplication.
///
/// Each key cycles MISS -> PENDING -> CACHED -> (EXPIRED -> MISS). Expired
/// entries are evicted lazily on lookup; only successful responses are ever
/// stored.
#[derive(Clone, Default)]
pub struct ResponseCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the cached-read contract for `key`.
    ///
    /// A fresh cache entry resolves immediately with no transport call. An
    /// in-flight fetch for the same key is shared, so N concurrent callers
    /// converge on one round trip and one parsed result. Otherwise `fetch`
    /// is started, registered as pending before it runs, and its successful
    /// result stored under the current timestamp. Failures propagate to every
    /// waiter and are never cached. A [`clear`](Self::clear) issued while the
    /// fetch is in flight discards its result instead of storing it, so no
    /// pre-clear data survives into the cleared cache.
    pub async fn fetch<F>(&self, key: String, ttl: Duration, fetch: F) -> FetchResult
    where
        F: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        let shared = {
            let mut inner = self.inner.lock().expect("cache lock poisoned");

            if let Some(entry) = inner.entries.get(&key) {
                if entry.fetched_at.elapsed() < ttl {
                    trace!(%key, "cache hit");
                    return Ok(Arc::clone(&entry.data));
                }
            }
            // Expired (or absent): lazy eviction.
            inner.entries.remove(&key);

            if let Some(pending) = inner.pending.get(&key) {
                trace!(%key, "joining in-flight request");
                pending.clone()
            } else {
                let store = Arc::clone(&self.inner);
                let pending_key = key.clone();
                let generation = inner.generation;
                let fut: SharedFetch = async move {
                    let result = fetch.await;
                    let mut inner = store.lock().expect("cache lock poisoned");
                    let current = inner.generation == generation;
                    if current {
                        inner.pending.remove(&pending_key);
                    }
                    match result {
                        Ok(value) => {
                            let data = Arc::new(value);
                            if current {
                                inner.entries.insert(
                                    pending_key,
                                    CacheEntry {
                                        data: Arc::clone(&data),
                                        fetched_at: Instant::now(),
                                    },
                                );
                            }
                            Ok(data)
                        }
                        Err(e) => Err(e),
                    }
                }
                .boxed()
                .shared();
                inner.pending.insert(key, fut.clone());
                fut
            }
        };

        shared.await
    }

    /// Drop every cache entry whose key starts with any of `prefixes`.
    ///
    /// Invalidation is deliberately coarse: guaranteed freshness after a
    /// mutation beats cache hit-rate.
    pub fn invalidate_prefixes(&self, prefixes: &[&str]) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let before = inner.entries.len();
        inner
            .entries
            .retain(|key, _| !prefixes.iter().any(|p| key.starts_with(p)));
        let dropped = before - inner.entries.len();
        if dropped > 0 {
            debug!(?prefixes, dropped, "invalidated cache entries");
        }
    }

    /// Drop all cached entries and all pending-request bookkeeping.
    ///
    /// Fetches still in flight keep resolving for their own waiters, but
    /// their results are discarded rather than stored.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.entries.clear();
        inner.pending.clear();
        inner.generation += 1;
    }

    /// Drop pending-request bookkeeping only, leaving cached entries intact.
    pub fn clear_pending(&self) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.pending.clear();
        inner.generation += 1;
    }
}
