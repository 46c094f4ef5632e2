//! Client library for connecting to hcached.
//!
//! Provides [`CacheClient`], which forwards request descriptors to a
//! remote hcached instance over gRPC.

mod cache_client;

pub use cache_client::CacheClient;
