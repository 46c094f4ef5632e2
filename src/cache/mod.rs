//! Cache coordination engine.
//!
//! - [`Fingerprint`]: stable 64-bit key derived from method, URL, body
//!   and normalized headers.
//! - [`CacheEntry`]: one cached upstream request and its latest
//!   [`Snapshot`], kept current by a dedicated refresher task.
//! - [`CacheService`]: the entry table and the `request` operation that
//!   looks up or creates an entry and waits for its first fetch.
//!
//! There is no central scheduler. Each entry refreshes itself every TTL and
//! removes itself from the table once it has been idle for longer than
//! [`CacheConfig::idle_timeout`].

mod entry;
mod fingerprint;
mod service;

pub use entry::{CacheEntry, Snapshot};
pub use fingerprint::Fingerprint;
pub use service::{CacheConfig, CacheService};
