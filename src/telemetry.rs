//! Telemetry metric name constants.
//!
//! Centralised metric names for hcache operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `hcache_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `url`: upstream URL of the cached request
//! - `status`: outcome: "ok" or "error"

/// Total requests served from an existing cache entry.
pub const CACHE_HITS_TOTAL: &str = "hcache_cache_hits_total";

/// Total requests that created a new cache entry.
pub const CACHE_MISSES_TOTAL: &str = "hcache_cache_misses_total";

/// Number of entries currently held in the cache table.
pub const CACHE_ENTRIES: &str = "hcache_cache_entries";

/// Total upstream fetches performed by entry refreshers.
///
/// Labels: `url`, `status` ("ok" | "error").
pub const FETCH_TOTAL: &str = "hcache_fetch_total";

/// Upstream fetch duration in seconds.
///
/// Labels: `url`.
pub const FETCH_DURATION_SECONDS: &str = "hcache_fetch_duration_seconds";
