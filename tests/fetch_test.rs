//! Tests for [`HttpFetcher`] against a wiremock upstream.

use std::sync::Arc;
use std::time::Duration;

use hcache::{
    CacheConfig, CacheError, CacheService, FetchExecutor, FetchRequest, HttpFetcher,
    RequestDescriptor,
};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetch_request(method: &str, url: String) -> FetchRequest {
    FetchRequest {
        method: method.to_string(),
        url,
        body: String::new(),
        headers: vec![],
    }
}

#[tokio::test]
async fn get_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rates"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"eur\":1.08}"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let body = fetcher
        .fetch(&fetch_request("GET", format!("{}/rates", server.uri())))
        .await
        .unwrap();
    assert_eq!(body, "{\"eur\":1.08}");
}

#[tokio::test]
async fn method_headers_and_body_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("x-token", "abc"))
        .and(header("accept", "text/plain"))
        .and(body_string("q=rust"))
        .respond_with(ResponseTemplate::new(200).set_body_string("found"))
        .expect(1)
        .mount(&server)
        .await;

    let request = FetchRequest {
        method: "POST".into(),
        url: format!("{}/search", server.uri()),
        body: "q=rust".into(),
        headers: vec![
            ("X-Token".into(), "abc".into()),
            ("Accept".into(), "text/plain".into()),
        ],
    };
    let body = HttpFetcher::new().unwrap().fetch(&request).await.unwrap();
    assert_eq!(body, "found");
}

#[tokio::test]
async fn wrapped_client_settings_are_kept() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "hcache-test/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .user_agent("hcache-test/1")
        .build()
        .unwrap();
    let body = HttpFetcher::from_client(client)
        .fetch(&fetch_request("GET", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "hello");
}

#[tokio::test]
async fn error_status_body_is_returned_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try again later"))
        .mount(&server)
        .await;

    let body = HttpFetcher::new()
        .unwrap()
        .fetch(&fetch_request("GET", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "try again later");
}

#[tokio::test]
async fn connection_refused_is_an_http_error() {
    // Reserve a port, then free it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = HttpFetcher::new()
        .unwrap()
        .fetch(&fetch_request("GET", format!("http://127.0.0.1:{port}/")))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_upstream_hits_client_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();
    let err = fetcher
        .fetch(&fetch_request("GET", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn invalid_method_is_rejected_before_sending() {
    let server = MockServer::start().await;

    let err = HttpFetcher::new()
        .unwrap()
        .fetch(&fetch_request("GE T", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidRequest(_)), "got {err:?}");

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn invalid_header_name_is_rejected() {
    let server = MockServer::start().await;

    let mut request = fetch_request("GET", server.uri());
    request.headers.push(("bad name".into(), "x".into()));

    let err = HttpFetcher::new()
        .unwrap()
        .fetch(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidRequest(_)), "got {err:?}");
}

#[tokio::test]
async fn cache_service_fetches_upstream_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shared"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1,2,3]"))
        .expect(1)
        .mount(&server)
        .await;

    let cache = CacheService::with_http(CacheConfig::default()).unwrap();
    let descriptor = RequestDescriptor::new(format!("{}/shared", server.uri()))
        .header("Accept", "application/json")
        .ttl(60);

    let mut handles = Vec::new();
    for _ in 0..5 {
        let cache = cache.clone();
        let descriptor = descriptor.clone();
        handles.push(tokio::spawn(async move {
            cache.request(&descriptor).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok("[1,2,3]".to_string()));
    }

    assert_eq!(cache.request(&descriptor).await, Ok("[1,2,3]".to_string()));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn json_descriptor_is_served_through_http() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/items"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new().unwrap());
    let cache = CacheService::new(fetcher, CacheConfig::default());
    let body = format!(
        r#"{{"method":"put","url":"{}/items","body":"payload","headers":["Content-Type: text/plain"],"ttl":30}}"#,
        server.uri()
    );

    assert_eq!(cache.request_json(&body).await, Ok("created".to_string()));
}
