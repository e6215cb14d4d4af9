//! End-to-end tests for the credential facade.

use quotient_core::{AccountKind, Credential};
use quotient_fetch::{FetchContext, HttpClient};
use quotient_providers::{ApiKeyClientConfig, OAuthClientConfig, QuotaError, QuotaFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USAGE_PATH: &str = "/api/oauth/usage";

fn fetcher(server: &MockServer) -> QuotaFetcher {
    QuotaFetcher::new(
        HttpClient::new().unwrap(),
        ApiKeyClientConfig::default().with_base_url(server.uri()),
        OAuthClientConfig::default().with_usage_url(format!("{}{USAGE_PATH}", server.uri())),
    )
}

async fn silent_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_missing_credential_no_network() {
    let server = silent_server().await;
    let err = fetcher(&server)
        .fetch(&FetchContext::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, QuotaError::MissingCredential));
    assert!(err.is_invalid_input());
}

#[tokio::test]
async fn test_empty_token_no_network() {
    let server = silent_server().await;
    let fetcher = fetcher(&server);

    for kind in [AccountKind::ApiKey, AccountKind::OAuth] {
        let credential = Credential::new("", kind);
        let err = fetcher
            .fetch(&FetchContext::new(), Some(&credential))
            .await
            .unwrap_err();
        assert!(matches!(err, QuotaError::EmptyAccessToken));
    }
}

#[tokio::test]
async fn test_missing_and_empty_are_distinct() {
    let server = silent_server().await;
    let fetcher = fetcher(&server);
    let ctx = FetchContext::new();

    let missing = fetcher.fetch(&ctx, None).await.unwrap_err();
    let empty = fetcher
        .fetch(&ctx, Some(&Credential::new("  ", AccountKind::OAuth)))
        .await
        .unwrap_err();
    assert_ne!(missing.to_string(), empty.to_string());
}

#[tokio::test]
async fn test_oauth_email_enrichment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USAGE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"five_hour": {"utilization": 0.25, "resets_at": ""}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let credential =
        Credential::new("oauth-token", AccountKind::OAuth).with_email("person@example.com");
    let quota = fetcher(&server)
        .fetch(&FetchContext::new(), Some(&credential))
        .await
        .unwrap();

    assert_eq!(quota.email, "person@example.com");
    assert!((quota.quota_percentage - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_organization_account_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/organization/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "organization": {"uuid": "org-acme", "name": "Acme"},
                "usage": {
                    "monthly_tokens": 1000000,
                    "used_tokens": 250000,
                    "remaining_tokens": 750000,
                    "next_reset_date": "2025-02-01"
                },
                "rate_limit": {"requests_per_minute": 60, "requests_remaining": 58},
                "account": {"plan_type": "build", "email_address": ""}
            }"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let credential =
        Credential::new("sk-ant-api03-acme", AccountKind::ApiKey).with_email("ops@acme.test");
    let quota = fetcher(&server)
        .fetch(&FetchContext::new(), Some(&credential))
        .await
        .unwrap();

    assert_eq!(quota.organization_id, "org-acme");
    assert_eq!(quota.organization_name, "Acme");
    assert_eq!(quota.monthly_quota, 1_000_000);
    assert_eq!(quota.used_quota, 250_000);
    assert_eq!(quota.remaining_quota, 750_000);
    assert!((quota.quota_percentage - 25.0).abs() < 1e-9);
    assert_eq!(quota.quota_reset_date, "2025-02-01");
    assert_eq!(quota.requests_limit, 60);
    assert_eq!(quota.requests_remaining, 58);
    assert_eq!(quota.plan_type, "build");
    assert_eq!(quota.email, "ops@acme.test");
    assert!(!quota.is_rolling_window());
}

#[tokio::test]
async fn test_acme_tolerant_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/organization/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "organization": {"uuid": "org-1", "name": "Acme", "region": "us"},
                "usage": {"monthly_tokens": 1000000, "used_tokens": 250000}
            }"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let credential = Credential::from_token("sk-ant-api03-acme");
    let quota = fetcher(&server)
        .fetch(&FetchContext::new(), Some(&credential))
        .await
        .unwrap();

    assert_eq!(quota.organization_id, "org-1");
    assert_eq!(quota.monthly_quota, 1_000_000);
    assert_eq!(quota.used_quota, 250_000);
    assert_eq!(quota.remaining_quota, 750_000);
    assert!((quota.quota_percentage - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_structured_decode_takes_precedence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/organization/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"usage": {"monthly_tokens": 100, "used_tokens": 40, "remaining_tokens": 0}}"#,
        ))
        .mount(&server)
        .await;

    let quota = fetcher(&server)
        .fetch_with_token(&FetchContext::new(), AccountKind::ApiKey, "sk-ant-api03-x")
        .await
        .unwrap();

    // The tolerant pass would have derived 60 here.
    assert_eq!(quota.remaining_quota, 0);
    assert!((quota.quota_percentage - 40.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_oauth_kind_never_probes_console_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USAGE_PATH))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/organization/usage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let credential = Credential::new("oauth-token", AccountKind::OAuth);
    let err = fetcher(&server)
        .fetch(&FetchContext::new(), Some(&credential))
        .await
        .unwrap_err();
    assert!(matches!(err, QuotaError::OAuthForbidden { .. }));
}
