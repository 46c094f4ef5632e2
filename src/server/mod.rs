//! gRPC server and shared proto types.
//!
//! This module provides:
//! - Generated protobuf types (`proto`) used by both server and client
//! - Conversions between [`CacheError`](crate::CacheError) and gRPC status (`convert`)
//! - The gRPC service implementation (`service`, server-only)
//! - Configuration types (`config`, server-only)
//!
//! The wire format is deliberately thin: a request carries the JSON
//! encoded [`RequestDescriptor`](crate::RequestDescriptor) and a reply
//! carries the cached body, so clients in any language only need a JSON
//! encoder and a gRPC stub.

#[cfg(feature = "server")]
pub mod config;
pub mod convert;
#[cfg(feature = "server")]
pub mod service;

/// Re-exported generated proto types.
pub mod proto {
    tonic::include_proto!("hcache.v1");
}

#[cfg(feature = "server")]
pub use service::CacheRpcService;
