//! reqwest-backed [`FetchExecutor`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};

use super::{FetchExecutor, FetchRequest};
use crate::{CacheError, Result};

/// Default bound for one upstream round-trip.
pub(crate) const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches upstream responses with a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after 30 seconds.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CacheError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| CacheError::InvalidRequest(format!("header {name:?} value: {e}")))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl FetchExecutor for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            CacheError::InvalidRequest(format!("method {:?}: {e}", request.method))
        })?;
        let headers = header_map(&request.headers)?;

        let response = self
            .client
            .request(method, &request.url)
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await?;

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_keeps_duplicates() {
        let map = header_map(&[
            ("Accept".into(), "text/html".into()),
            ("accept".into(), "application/json".into()),
        ])
        .unwrap();
        assert_eq!(map.get_all("accept").iter().count(), 2);
    }

    #[test]
    fn header_map_rejects_invalid_names() {
        let err = header_map(&[("bad name".into(), "x".into())]).unwrap_err();
        assert!(matches!(err, CacheError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn invalid_method_is_rejected_before_sending() {
        let fetcher = HttpFetcher::new().unwrap();
        let request = FetchRequest {
            method: "GE T".into(),
            url: "http://127.0.0.1:9/".into(),
            body: String::new(),
            headers: vec![],
        };
        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let fetcher = HttpFetcher::new().unwrap();
        let request = FetchRequest {
            method: "GET".into(),
            url: "not a url".into(),
            body: String::new(),
            headers: vec![],
        };
        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidRequest(_)));
    }
}
