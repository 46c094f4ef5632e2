//! [`CacheClient`]: gRPC client for hcached.

use tonic::transport::Channel;

use crate::server::convert::from_status;
use crate::server::proto;
use crate::server::proto::cache_client::CacheClient as ProtoClient;
use crate::{CacheError, RequestDescriptor, Result};

/// Client for a remote hcached server.
///
/// Cheap to clone; clones share one HTTP/2 connection.
#[derive(Debug, Clone)]
pub struct CacheClient {
    inner: ProtoClient<Channel>,
}

impl CacheClient {
    /// Connect to an hcached server at the given address.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = CacheClient::connect("http://127.0.0.1:6001").await?;
    /// ```
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let inner = ProtoClient::connect(addr.clone())
            .await
            .map_err(|e| CacheError::Http(format!("failed to connect to {addr}: {e}")))?;
        Ok(Self { inner })
    }

    /// Return the cached response for `descriptor`.
    pub async fn request(&self, descriptor: &RequestDescriptor) -> Result<String> {
        let body = serde_json::to_string(descriptor)?;
        self.request_json(body).await
    }

    /// Send an already encoded JSON descriptor.
    pub async fn request_json(&self, body: impl Into<String>) -> Result<String> {
        let request = proto::CacheRequest { body: body.into() };
        let reply = self
            .inner
            .clone()
            .request(request)
            .await
            .map_err(from_status)?;
        Ok(reply.into_inner().response)
    }
}
