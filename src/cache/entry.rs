//! Cache entries and the refresher task that keeps each one current.
//!
//! # Lifecycle
//!
//! Every [`CacheEntry`] is owned by exactly one refresher task, spawned when
//! the entry is inserted into the table:
//!
//! - **Initializing**: the first fetch runs immediately. Until it
//!   completes the entry has no snapshot and every caller waits in
//!   [`CacheEntry::wait`].
//! - **Serving**: the task sleeps for the entry's TTL, checks whether the
//!   entry has been idle longer than the configured timeout and, if not,
//!   fetches again and publishes the result under the stale-on-failure
//!   policy (see [`CacheEntry::apply`]).
//! - **Evicted**: the idle check fired; the task removes the entry from
//!   the table and exits. Callers still holding the entry keep reading its
//!   last snapshot.
//!
//! Response and error are always published together as one immutable
//! [`Snapshot`] through a `watch` channel, so readers never block on a
//! fetch in progress and never observe a half-written pair.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::fingerprint::Fingerprint;
use super::service::Shared;
use crate::fetch::{FetchExecutor, FetchRequest};
use crate::telemetry;
use crate::types::PreparedRequest;
use crate::{CacheError, Result};

/// Outcome of the most recent fetch cycle that changed an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    response: String,
    error: Option<CacheError>,
}

impl Snapshot {
    fn ok(response: String) -> Self {
        Self {
            response,
            error: None,
        }
    }

    fn failed(error: CacheError) -> Self {
        Self {
            response: String::new(),
            error: Some(error),
        }
    }

    /// Cached response body; empty until a fetch has succeeded.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Error of the last fetch, only set while no good response exists.
    pub fn error(&self) -> Option<&CacheError> {
        self.error.as_ref()
    }

    /// The value handed to callers: the error if there is one, the body otherwise.
    pub fn to_result(&self) -> Result<String> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.response.clone()),
        }
    }
}

/// One cached upstream request.
///
/// Fetch parameters are fixed at creation: later requests with the same
/// fingerprint describe the same request and never change them.
#[derive(Debug)]
pub struct CacheEntry {
    fingerprint: Fingerprint,
    request: FetchRequest,
    ttl: Duration,
    created: Instant,
    /// Milliseconds after `created`; only ever moves forward.
    last_access_ms: AtomicU64,
    state: watch::Sender<Option<Arc<Snapshot>>>,
}

impl CacheEntry {
    pub(crate) fn new(fingerprint: Fingerprint, prepared: PreparedRequest) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            fingerprint,
            request: prepared.request,
            ttl: prepared.ttl,
            created: Instant::now(),
            last_access_ms: AtomicU64::new(0),
            state,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Latest snapshot, or `None` while the first fetch is still running.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.borrow().clone()
    }

    /// Wait until the first fetch has completed and return the latest snapshot.
    pub async fn wait(&self) -> Result<Arc<Snapshot>> {
        let mut rx = self.state.subscribe();
        let current = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| CacheError::Closed)?;
        let snapshot: Option<Arc<Snapshot>> = (*current).clone();
        snapshot.ok_or(CacheError::Closed)
    }

    /// Record an access.
    pub(crate) fn touch(&self) {
        let now = self.created.elapsed().as_millis() as u64;
        self.last_access_ms.fetch_max(now, Ordering::Relaxed);
    }

    /// Time since the last completed request (or since creation).
    pub fn idle_for(&self) -> Duration {
        let last_access = Duration::from_millis(self.last_access_ms.load(Ordering::Relaxed));
        self.created.elapsed().saturating_sub(last_access)
    }

    /// Publish the outcome of a fetch.
    ///
    /// A success replaces the snapshot. A failure is only published when
    /// the entry has no non-empty response yet; otherwise the previous
    /// response keeps being served and the error is dropped. Returns
    /// whether the snapshot changed.
    pub(crate) fn apply(&self, outcome: Result<String>) -> bool {
        self.state.send_if_modified(|current| match outcome {
            Ok(response) => {
                *current = Some(Arc::new(Snapshot::ok(response)));
                true
            }
            Err(_) if current.as_ref().is_some_and(|s| !s.response.is_empty()) => false,
            Err(error) => {
                *current = Some(Arc::new(Snapshot::failed(error)));
                true
            }
        })
    }
}

/// Background task bound to one [`CacheEntry`].
pub(crate) struct Refresher {
    entry: Arc<CacheEntry>,
    service: Weak<Shared>,
    fetcher: Arc<dyn FetchExecutor>,
    idle_timeout: Option<Duration>,
    fetch_timeout: Duration,
}

impl Refresher {
    pub(crate) fn new(entry: Arc<CacheEntry>, service: &Arc<Shared>) -> Self {
        let config = service.config();
        Self {
            entry,
            service: Arc::downgrade(service),
            fetcher: service.fetcher(),
            idle_timeout: (!config.idle_timeout.is_zero()).then_some(config.idle_timeout),
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Run until the entry is evicted or the service is gone.
    pub(crate) async fn run(self) {
        let outcome = self.fetch().await;
        self.entry.apply(outcome);

        loop {
            tokio::time::sleep(self.entry.ttl).await;

            let Some(service) = self.service.upgrade() else {
                debug!(fingerprint = %self.entry.fingerprint, "cache service dropped, stopping refresher");
                return;
            };

            if let Some(timeout) = self.idle_timeout {
                let idle = self.entry.idle_for();
                if idle > timeout {
                    service.remove(&self.entry);
                    info!(
                        fingerprint = %self.entry.fingerprint,
                        idle_secs = idle.as_secs(),
                        "cache entry timed out, purging from cache"
                    );
                    return;
                }
            }
            drop(service);

            let outcome = self.fetch().await;
            let failed = outcome.is_err();
            if !self.entry.apply(outcome) && failed {
                debug!(fingerprint = %self.entry.fingerprint, "refresh failed, serving stale response");
            }
        }
    }

    /// One upstream round-trip, bounded by the fetch timeout.
    async fn fetch(&self) -> Result<String> {
        let request = &self.entry.request;
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(request))
            .await
            .unwrap_or(Err(CacheError::FetchTimeout(self.fetch_timeout)));
        let elapsed = start.elapsed();

        metrics::histogram!(telemetry::FETCH_DURATION_SECONDS, "url" => request.url.clone())
            .record(elapsed.as_secs_f64());

        match &outcome {
            Ok(body) => {
                metrics::counter!(telemetry::FETCH_TOTAL, "url" => request.url.clone(), "status" => "ok")
                    .increment(1);
                debug!(
                    fingerprint = %self.entry.fingerprint,
                    fetcher = self.fetcher.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    bytes = body.len(),
                    "fetched cache entry"
                );
            }
            Err(e) => {
                metrics::counter!(telemetry::FETCH_TOTAL, "url" => request.url.clone(), "status" => "error")
                    .increment(1);
                error!(
                    fingerprint = %self.entry.fingerprint,
                    url = %request.url,
                    error = %e,
                    "failed to fetch cache entry"
                );
            }
        }

        outcome
    }
}
