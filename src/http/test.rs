use crate::config::ApiConfig;
use crate::http::{DemoApi, DemoApiError, DemoHttpClient};
use crate::role::Role;
use serde_json::json;
use std::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: format!("{}/", server.uri()),
        ..ApiConfig::default()
    }
}

#[tokio::test]
async fn test_client_trims_trailing_slash_from_base_url() {
    let server = MockServer::start().await;
    let client = DemoHttpClient::new(&config_for(&server)).unwrap();

    assert_eq!(client.base_url(), server.uri());
    assert!(!client.uses_legacy_token_route());
}

#[tokio::test]
async fn test_token_is_served_from_cache_until_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/demo/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "t-staff",
            "role": "staff",
            "outletId": "demo-outlet-1",
            "displayName": "Demo Cashier"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = DemoHttpClient::new(&config_for(&server)).unwrap();

    let first = client.fetch_role_token(Role::Staff).await.unwrap();
    let second = client.fetch_role_token(Role::Staff).await.unwrap();
    assert_eq!(first, second);

    client.clear_cache();
    client.fetch_role_token(Role::Staff).await.unwrap();
}

#[tokio::test]
async fn test_zero_ttl_disables_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/demo/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "t-admin",
            "role": "admin"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let config = ApiConfig {
        token_ttl_seconds: 0,
        ..config_for(&server)
    };
    let client = DemoHttpClient::new(&config).unwrap();

    client.fetch_role_token(Role::Admin).await.unwrap();
    client.fetch_role_token(Role::Admin).await.unwrap();
}

#[tokio::test]
async fn test_empty_access_token_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/demo/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "  ",
            "role": "customer"
        })))
        .mount(&server)
        .await;

    let client = DemoHttpClient::new(&config_for(&server)).unwrap();
    let result = client.fetch_role_token(Role::Customer).await;

    assert!(matches!(result, Err(DemoApiError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_rate_limiting_spaces_out_requests_beyond_burst() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/demo/reset"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let config = ApiConfig {
        requests_per_second: 10,
        burst: 1,
        ..config_for(&server)
    };
    let client = DemoHttpClient::new(&config).unwrap();

    let start = Instant::now();
    for _ in 0..3 {
        client.reset_demo_data().await.unwrap();
    }
    let elapsed = start.elapsed();

    // Burst of one at 10/s: the two extra calls wait roughly 100ms each
    assert!(elapsed.as_millis() >= 150, "three resets took {elapsed:?}");
}
