//! hcache - shared single-flight cache for outbound HTTP requests
//!
//! Many processes asking for the same upstream resource share one cached
//! response. The first request for a resource fetches it; concurrent and
//! later requests wait for, or immediately receive, that same result. Each
//! cached resource is refreshed in the background every TTL, keeps serving
//! its last good body when a refresh fails, and is evicted after it has not
//! been requested for a configured idle timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use hcache::{CacheConfig, CacheService, RequestDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> hcache::Result<()> {
//!     let cache = CacheService::with_http(CacheConfig::default())?;
//!
//!     let descriptor = RequestDescriptor::new("https://example.com/rates.json")
//!         .header("Accept", "application/json")
//!         .ttl(30);
//!
//!     // Fetches once, then served from the cache for every caller.
//!     let body = cache.request(&descriptor).await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```
//!
//! # Service mode
//!
//! With the `server` feature, `hcached` exposes a [`CacheService`] over
//! gRPC so that several client processes share one cache; the `client`
//! feature provides [`client::CacheClient`] and the `hcache` CLI.

pub mod cache;
#[cfg(feature = "client")]
pub mod client;
pub mod error;
pub mod fetch;
#[cfg(any(feature = "server", feature = "client"))]
pub mod server;
pub mod telemetry;
pub mod types;
mod version;

pub use cache::{CacheConfig, CacheEntry, CacheService, Fingerprint, Snapshot};
pub use error::{CacheError, Result};
pub use fetch::{FetchExecutor, FetchRequest, HttpFetcher};
pub use types::{Headers, RequestDescriptor};
pub use version::{PKG_VERSION, version_string};
