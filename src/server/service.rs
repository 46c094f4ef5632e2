//! gRPC service implementation.

use tonic::{Request, Response, Status};

use super::convert::to_status;
use super::proto;
use super::proto::cache_server::Cache;
use crate::CacheService;

/// gRPC service that serves requests from a [`CacheService`].
pub struct CacheRpcService {
    cache: CacheService,
}

impl CacheRpcService {
    /// Create a new service wrapping the given cache.
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }

    /// Wrap the service for registration with a tonic server.
    pub fn into_server(self) -> proto::cache_server::CacheServer<Self> {
        proto::cache_server::CacheServer::new(self)
    }
}

#[tonic::async_trait]
impl Cache for CacheRpcService {
    async fn request(
        &self,
        request: Request<proto::CacheRequest>,
    ) -> Result<Response<proto::CacheReply>, Status> {
        let body = request.into_inner().body;
        let response = self.cache.request_json(&body).await.map_err(to_status)?;
        Ok(Response::new(proto::CacheReply { response }))
    }
}
