//! The cache table and its request operation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use tracing::{info, warn};

use super::entry::{CacheEntry, Refresher};
use super::fingerprint::Fingerprint;
use crate::fetch::{FetchExecutor, HttpFetcher};
use crate::telemetry;
use crate::types::{PreparedRequest, RequestDescriptor};
use crate::Result;

/// Configuration for the cache service.
///
/// ```rust
/// # use hcache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .idle_timeout(Duration::from_secs(600))
///     .fetch_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries not requested for longer than this are evicted; zero
    /// disables eviction. Default: 2 hours.
    pub idle_timeout: Duration,
    /// Upper bound for one upstream fetch. Default: 30 seconds.
    pub fetch_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(2 * 60 * 60),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle-eviction timeout (`Duration::ZERO` never evicts).
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the upper bound for one upstream fetch.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// State shared between the service handle and the refresher tasks.
///
/// Refreshers only hold a `Weak` reference, so dropping the last
/// [`CacheService`] lets every refresher stop at its next wake-up.
pub(crate) struct Shared {
    table: Cache<Fingerprint, Arc<CacheEntry>>,
    entries: AtomicU64,
    fetcher: Arc<dyn FetchExecutor>,
    config: CacheConfig,
}

impl Shared {
    pub(crate) fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub(crate) fn fetcher(&self) -> Arc<dyn FetchExecutor> {
        self.fetcher.clone()
    }

    /// Look up the entry for `fingerprint`, creating it and starting its
    /// refresher if it does not exist yet.
    ///
    /// The initializer runs at most once per absent key, so concurrent
    /// callers for the same fingerprint share one entry and one refresher.
    fn get_or_create(
        self: &Arc<Self>,
        fingerprint: Fingerprint,
        prepared: PreparedRequest,
    ) -> Arc<CacheEntry> {
        let entry = self.table.entry(fingerprint).or_insert_with(|| {
            let entry = Arc::new(CacheEntry::new(fingerprint, prepared));
            info!(
                %fingerprint,
                url = %entry.request().url,
                ttl_secs = entry.ttl().as_secs(),
                "created new cache entry"
            );
            self.entries.fetch_add(1, Ordering::Relaxed);
            metrics::gauge!(telemetry::CACHE_ENTRIES).increment(1.0);
            tokio::spawn(Refresher::new(entry.clone(), self).run());
            entry
        });

        if entry.is_fresh() {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        }
        entry.into_value()
    }

    /// Remove `entry` from the table. Called by the entry's own refresher.
    ///
    /// Only removes the exact entry given: returns `false` if its key is
    /// absent or already maps to a newer entry.
    pub(crate) fn remove(&self, entry: &Arc<CacheEntry>) -> bool {
        let result = self
            .table
            .entry(entry.fingerprint())
            .and_compute_with(|current| match current {
                Some(current) if Arc::ptr_eq(current.value(), entry) => Op::Remove,
                _ => Op::Nop,
            });
        if !matches!(result, CompResult::Removed(_)) {
            return false;
        }
        self.entries.fetch_sub(1, Ordering::Relaxed);
        metrics::gauge!(telemetry::CACHE_ENTRIES).decrement(1.0);
        true
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        // Refreshers stop without removing their entries once the service is gone.
        let remaining = *self.entries.get_mut();
        if remaining > 0 {
            metrics::gauge!(telemetry::CACHE_ENTRIES).decrement(remaining as f64);
        }
    }
}

/// Shared response cache for outbound HTTP requests.
///
/// Cheap to clone; clones share one table. Every entry is refreshed in the
/// background by its own task, so a service must be used from within a
/// tokio runtime.
///
/// ```rust,no_run
/// use hcache::{CacheConfig, CacheService, RequestDescriptor};
///
/// # async fn example() -> hcache::Result<()> {
/// let cache = CacheService::with_http(CacheConfig::default())?;
/// let body = cache
///     .request(&RequestDescriptor::new("http://example.com/").ttl(60))
///     .await?;
/// println!("{body}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CacheService {
    shared: Arc<Shared>,
}

impl CacheService {
    /// Create a service that fetches through `fetcher`.
    pub fn new(fetcher: Arc<dyn FetchExecutor>, config: CacheConfig) -> Self {
        let table = Cache::builder().name("hcache-entries").build();
        Self {
            shared: Arc::new(Shared {
                table,
                entries: AtomicU64::new(0),
                fetcher,
                config,
            }),
        }
    }

    /// Create a service backed by an [`HttpFetcher`] using the configured
    /// fetch timeout.
    pub fn with_http(config: CacheConfig) -> Result<Self> {
        let fetcher = HttpFetcher::with_timeout(config.fetch_timeout)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Decode a JSON request descriptor and serve it, see [`request`](Self::request).
    pub async fn request_json(&self, body: &str) -> Result<String> {
        let descriptor = RequestDescriptor::from_json(body).inspect_err(|e| {
            warn!(error = %e, "failed to decode request");
        })?;
        self.request(&descriptor).await
    }

    /// Return the cached response for `descriptor`.
    ///
    /// The first request for a fingerprint creates its entry and waits for
    /// the first fetch; later requests return the latest snapshot
    /// immediately. The error of a failed fetch is only returned while the
    /// entry has never produced a response.
    ///
    /// Malformed headers and TTLs below one second are rejected before the
    /// table is touched.
    pub async fn request(&self, descriptor: &RequestDescriptor) -> Result<String> {
        let prepared = descriptor.prepare().inspect_err(|e| {
            warn!(url = %descriptor.url, error = %e, "rejecting request");
        })?;
        let fingerprint = Fingerprint::of(&prepared.request);

        let entry = self.shared.get_or_create(fingerprint, prepared);
        let snapshot = entry.wait().await?;
        entry.touch();
        snapshot.to_result()
    }

    /// Number of entries in the table.
    pub fn len(&self) -> u64 {
        self.shared.entries.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry for `fingerprint` is currently cached.
    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.shared.table.contains_key(&fingerprint)
    }

    /// The entry for `fingerprint`, if cached.
    pub fn entry(&self, fingerprint: Fingerprint) -> Option<Arc<CacheEntry>> {
        self.shared.table.get(&fingerprint)
    }
}
