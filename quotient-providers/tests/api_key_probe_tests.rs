//! Endpoint probing tests for the API-key client.

use std::time::Duration;

use quotient_fetch::{FetchContext, HttpClient, HttpError};
use quotient_providers::{ApiKeyClientConfig, ApiKeyQuotaClient, QuotaError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "sk-ant-api03-test";

fn client(server: &MockServer) -> ApiKeyQuotaClient {
    ApiKeyQuotaClient::new(
        HttpClient::new().unwrap(),
        ApiKeyClientConfig::default().with_base_url(server.uri()),
    )
}

async fn mount_status(server: &MockServer, endpoint: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn received_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_third_endpoint_succeeds_after_three_calls() {
    let server = MockServer::start().await;
    mount_status(&server, "/organization/usage", 404, "").await;
    mount_status(&server, "/organization/quota", 500, "down").await;
    Mock::given(method("GET"))
        .and(path("/account/usage"))
        .and(header("authorization", "Bearer sk-ant-api03-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"usage": {"monthly_tokens": 200, "used_tokens": 50, "remaining_tokens": 150}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let quota = client(&server)
        .fetch_quota(&FetchContext::new(), TOKEN)
        .await
        .unwrap();

    assert_eq!(quota.monthly_quota, 200);
    assert!((quota.quota_percentage - 25.0).abs() < 1e-9);
    assert_eq!(
        received_paths(&server).await,
        vec!["/organization/usage", "/organization/quota", "/account/usage"]
    );
}

#[tokio::test]
async fn test_all_fail_returns_last_error() {
    let server = MockServer::start().await;
    mount_status(&server, "/organization/usage", 500, "first").await;
    mount_status(&server, "/organization/quota", 404, "").await;
    mount_status(&server, "/account/usage", 403, "").await;
    mount_status(&server, "/usage", 502, "last").await;

    let err = client(&server)
        .fetch_quota(&FetchContext::new(), TOKEN)
        .await
        .unwrap_err();

    match err {
        QuotaError::UnexpectedStatus {
            endpoint,
            status,
            body,
        } => {
            assert!(endpoint.ends_with("/usage"));
            assert!(!endpoint.ends_with("/account/usage"));
            assert_eq!(status, 502);
            assert_eq!(body, "last");
        }
        other => panic!("expected last endpoint's status error, got {other:?}"),
    }
    assert_eq!(received_paths(&server).await.len(), 4);
}

#[tokio::test]
async fn test_final_not_found_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(4)
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_quota(&FetchContext::new(), TOKEN)
        .await
        .unwrap_err();

    assert!(matches!(err, QuotaError::EndpointNotFound { .. }));
    let message = err.to_string();
    assert!(message.contains("organization quota information"));
    assert!(message.contains("individual/free accounts"));
}

#[tokio::test]
async fn test_final_unauthorized_is_access_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_quota(&FetchContext::new(), TOKEN)
        .await
        .unwrap_err();

    assert!(matches!(err, QuotaError::AccessDenied { status: 401, .. }));
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_non_json_body_tries_next_endpoint() {
    let server = MockServer::start().await;
    mount_status(&server, "/organization/usage", 200, "<html>login</html>").await;
    mount_status(
        &server,
        "/organization/quota",
        200,
        r#"{"organization": {"uuid": "org-2", "name": "Beta"}}"#,
    )
    .await;

    let quota = client(&server)
        .fetch_quota(&FetchContext::new(), TOKEN)
        .await
        .unwrap();
    assert_eq!(quota.organization_name, "Beta");
}

#[tokio::test]
async fn test_cancelled_context_stops_probing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = FetchContext::new();
    ctx.cancel();

    let err = client(&server).fetch_quota(&ctx, TOKEN).await.unwrap_err();
    assert!(err.is_context_done());
    assert!(matches!(
        err,
        QuotaError::Transport {
            source: HttpError::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn test_deadline_stops_probing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let ctx = FetchContext::builder()
        .timeout(Duration::from_millis(200))
        .build();
    let err = client(&server).fetch_quota(&ctx, TOKEN).await.unwrap_err();

    assert!(err.is_context_done());
    assert!(received_paths(&server).await.len() <= 1);
}

#[tokio::test]
async fn test_empty_endpoint_list() {
    let server = MockServer::start().await;
    let config = ApiKeyClientConfig {
        endpoints: Vec::new(),
        ..ApiKeyClientConfig::default().with_base_url(server.uri())
    };
    let client = ApiKeyQuotaClient::new(HttpClient::new().unwrap(), config);

    let err = client
        .fetch_quota(&FetchContext::new(), TOKEN)
        .await
        .unwrap_err();
    assert!(matches!(err, QuotaError::NoEndpointsConfigured));
}

#[tokio::test]
async fn test_blank_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_quota(&FetchContext::new(), " \t")
        .await
        .unwrap_err();
    assert!(matches!(err, QuotaError::EmptyAccessToken));
}

#[tokio::test]
async fn test_array_body_moves_to_next_endpoint() {
    let server = MockServer::start().await;
    mount_status(&server, "/organization/usage", 200, "[]").await;
    mount_status(
        &server,
        "/organization/quota",
        200,
        r#"{"usage": {"monthly_tokens": 1000, "used_tokens": 400}}"#,
    )
    .await;

    let quota = client(&server)
        .fetch_quota(&FetchContext::new(), TOKEN)
        .await
        .unwrap();

    assert_eq!(quota.monthly_quota, 1000);
    assert_eq!(quota.used_quota, 400);
    assert_eq!(quota.remaining_quota, 600);
    assert_eq!(
        received_paths(&server).await,
        vec!["/organization/usage", "/organization/quota"]
    );
}

#[tokio::test]
async fn test_unencodable_token_is_invalid_input() {
    let server = MockServer::start().await;
    mount_status(&server, "/organization/usage", 200, "{}").await;

    let err = client(&server)
        .fetch_quota(&FetchContext::new(), "sk-ant-api03-ab\ncd")
        .await
        .unwrap_err();

    assert!(matches!(err, QuotaError::InvalidAccessToken { .. }));
    assert!(err.is_invalid_input());
    assert!(received_paths(&server).await.is_empty());
}
