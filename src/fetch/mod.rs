//! Upstream fetching.
//!
//! Cache entries never talk to the network directly; every refresh goes
//! through a [`FetchExecutor`]. [`HttpFetcher`] is the reqwest-backed
//! implementation used by the daemon, tests substitute their own.

mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;

use crate::Result;

/// Parameters of one upstream HTTP round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Upper-cased HTTP method.
    pub method: String,
    pub url: String,
    pub body: String,
    /// Trimmed `(name, value)` pairs, in the order the client sent them.
    pub headers: Vec<(String, String)>,
}

/// Performs a single HTTP request/response cycle.
///
/// Implementations return the response body verbatim. The HTTP status code
/// is not interpreted: a `404` page is cached like any other body. Errors
/// are reserved for requests that could not be sent or whose body could not
/// be read.
#[async_trait]
pub trait FetchExecutor: Send + Sync {
    /// Executor name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch the response body for `request`.
    async fn fetch(&self, request: &FetchRequest) -> Result<String>;
}
