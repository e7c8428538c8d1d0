//! Tests for the HTTP client module

use super::*;
use crate::engine::Transport;
use crate::error::Error;
use crate::request::RequestTarget;
use crate::types::{BackoffType, StringMap};
use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_client(max_retries: u32) -> HttpClient {
    let config = HttpClientConfig::builder()
        .max_retries(max_retries)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_millis(10),
        )
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

fn params(pairs: &[(&str, &str)]) -> StringMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 3);
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("riksdagen-harvest/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(10))
        .max_retries(5)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .header("X-Custom", "value")
        .header("User-Agent", "dataplattform/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(10));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert!(!config.default_headers.contains_key("User-Agent"));
    assert_eq!(config.user_agent, "dataplattform/1.0");
}

#[tokio::test]
async fn test_get_structured_target_sends_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/voteringlista/"))
        .and(query_param("rm", "2023/24"))
        .and(query_param("utformat", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(0);
    let target = RequestTarget::for_endpoint(
        &server.uri(),
        "voteringlista/",
        params(&[("rm", "2023/24"), ("utformat", "json")]),
    );
    let body = client.get_text(&target).await.unwrap();
    assert_eq!(body, r#"{"ok":true}"#);
}

#[tokio::test]
async fn test_fetch_raw_url_through_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dokumentlista/"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("page two"))
        .mount(&server)
        .await;

    let client = fast_client(0);
    let target = RequestTarget::raw(format!("{}/dokumentlista/?p=2", server.uri()));
    let body = client.fetch(&target).await.unwrap();
    assert_eq!(body, "page two");
}

#[tokio::test]
async fn test_default_headers_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("X-Source", "harvest"))
        .and(header("User-Agent", "dataplattform/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .header("X-Source", "harvest")
        .user_agent("dataplattform/1.0")
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(config).unwrap();
    let target = RequestTarget::for_endpoint(&server.uri(), "personlista/", StringMap::new());
    client.get_text(&target).await.unwrap();
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such list"))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(3);
    let target = RequestTarget::for_endpoint(&server.uri(), "missing/", StringMap::new());
    let err = client.get_text(&target).await.unwrap_err();
    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such list");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let client = fast_client(3);
    let target = RequestTarget::for_endpoint(&server.uri(), "anforandelista/", StringMap::new());
    assert_eq!(client.get_text(&target).await.unwrap(), "recovered");
}

#[tokio::test]
async fn test_rate_limited_response_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = fast_client(2);
    let target = RequestTarget::for_endpoint(&server.uri(), "voteringlista/", StringMap::new());
    assert_eq!(client.get_text(&target).await.unwrap(), "ok");
}

#[tokio::test]
async fn test_max_retries_surfaces_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let client = fast_client(2);
    let target = RequestTarget::for_endpoint(&server.uri(), "voteringlista/", StringMap::new());
    let err = client.get_text(&target).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_invalid_target_fails_before_request() {
    let client = fast_client(0);
    let err = client
        .get_text(&RequestTarget::raw("not a url"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

#[test]
fn test_backoff_calculations() {
    let exponential = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Exponential,
                Duration::from_millis(100),
                Duration::from_secs(1),
            )
            .build(),
    )
    .unwrap();
    assert_eq!(exponential.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(exponential.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(exponential.calculate_backoff(10), Duration::from_secs(1));

    let linear = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Linear,
                Duration::from_millis(100),
                Duration::from_secs(1),
            )
            .build(),
    )
    .unwrap();
    assert_eq!(linear.calculate_backoff(2), Duration::from_millis(300));

    let constant = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Constant,
                Duration::from_millis(250),
                Duration::from_secs(1),
            )
            .build(),
    )
    .unwrap();
    assert_eq!(constant.calculate_backoff(5), Duration::from_millis(250));
}

#[test]
fn test_client_debug_hides_internals() {
    let client = fast_client(1);
    let debug = format!("{client:?}");
    assert!(debug.contains("HttpClient"));
    assert!(debug.contains("has_rate_limiter: false"));
}
