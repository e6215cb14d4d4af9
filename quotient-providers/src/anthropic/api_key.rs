//! Administrative quota client for API-key and organization accounts.

use quotient_core::{AccountKind, QuotaInfo};
use quotient_fetch::{FetchContext, HttpClient, ProbeFailure, build_headers, probe_in_order_with};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::error::QuotaError;
use super::parser::parse_quota_response;
use crate::source::QuotaSource;

// ============================================================================
// Constants
// ============================================================================

/// Console API base URL.
pub const CONSOLE_API_BASE_URL: &str = "https://console.anthropic.com/api/v1";

/// Candidate quota paths, most specific first.
pub const QUOTA_ENDPOINTS: [&str; 4] = [
    "/organization/usage",
    "/organization/quota",
    "/account/usage",
    "/usage",
];

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ============================================================================
// Configuration
// ============================================================================

/// Settings for [`ApiKeyQuotaClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyClientConfig {
    /// Base URL the endpoint paths are appended to.
    pub base_url: String,
    /// Paths to probe, in order.
    pub endpoints: Vec<String>,
    /// Value of the `anthropic-version` header.
    pub api_version: String,
}

impl Default for ApiKeyClientConfig {
    fn default() -> Self {
        Self {
            base_url: CONSOLE_API_BASE_URL.to_string(),
            endpoints: QUOTA_ENDPOINTS.iter().map(ToString::to_string).collect(),
            api_version: ANTHROPIC_VERSION.to_string(),
        }
    }
}

impl ApiKeyClientConfig {
    /// Replaces the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full URL for `path`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

// ============================================================================
// Client
// ============================================================================

/// Queries the Console quota endpoints with a bearer token.
///
/// Endpoints are probed one at a time in configured order; the first 200
/// with a parseable body wins.
#[derive(Debug, Clone)]
pub struct ApiKeyQuotaClient {
    http: HttpClient,
    config: ApiKeyClientConfig,
}

impl ApiKeyQuotaClient {
    /// Creates a client on a shared HTTP client.
    pub fn new(http: HttpClient, config: ApiKeyClientConfig) -> Self {
        Self { http, config }
    }

    /// Creates a client with default HTTP settings and endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Client`] if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, QuotaError> {
        let http = HttpClient::new().map_err(QuotaError::Client)?;
        Ok(Self::new(http, ApiKeyClientConfig::default()))
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ApiKeyClientConfig {
        &self.config
    }

    /// Fetches quota, probing each configured endpoint until one succeeds.
    ///
    /// # Errors
    ///
    /// Returns the last endpoint's error if all fail, or stops early with
    /// the transport error once `ctx` is cancelled or past its deadline.
    /// A token that cannot be sent as a header is
    /// [`QuotaError::InvalidAccessToken`], raised before any request.
    #[instrument(skip(self, ctx, access_token), fields(endpoints = self.config.endpoints.len()))]
    pub async fn fetch_quota(
        &self,
        ctx: &FetchContext,
        access_token: &str,
    ) -> Result<QuotaInfo, QuotaError> {
        let token = access_token.trim();
        if token.is_empty() {
            return Err(QuotaError::EmptyAccessToken);
        }

        let headers = self.request_headers(token)?;
        let headers = &headers;

        let outcome = probe_in_order_with(
            self.config.endpoints.as_slice(),
            move |path| self.query_endpoint(ctx, headers, path),
            |e: &QuotaError| !e.is_context_done(),
        )
        .await;

        let attempts = outcome.attempts_count();
        match outcome.result {
            Ok(success) => {
                info!(
                    endpoint = %success.endpoint,
                    attempts,
                    elapsed_ms = u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
                    "Retrieved organization quota"
                );
                Ok(success.value)
            }
            Err(ProbeFailure::Exhausted(e)) => Err(e),
            Err(ProbeFailure::NoEndpoints) => Err(QuotaError::NoEndpointsConfigured),
        }
    }

    fn request_headers(&self, token: &str) -> Result<HeaderMap, QuotaError> {
        let bearer = format!("Bearer {token}");
        build_headers([
            ("Authorization", bearer.as_str()),
            ("Content-Type", "application/json"),
            ("Accept", "application/json"),
            ("anthropic-version", self.config.api_version.as_str()),
        ])
        .map_err(QuotaError::from_header_error)
    }

    async fn query_endpoint(
        &self,
        ctx: &FetchContext,
        headers: &HeaderMap,
        path: String,
    ) -> Result<QuotaInfo, QuotaError> {
        let url = self.config.endpoint_url(&path);

        let response = self
            .http
            .get_with_headers(ctx, &url, headers.clone())
            .await
            .map_err(|source| QuotaError::Transport {
                endpoint: url.clone(),
                source,
            })?;

        if !response.is_ok() {
            debug!(endpoint = %url, status = %response.status, "Quota endpoint rejected request");
            return Err(status_error(url, response.status, response.body));
        }

        parse_quota_response(&response.body).map_err(|source| {
            debug!(endpoint = %url, error = %source, "Quota body is not a JSON object");
            QuotaError::Parse {
                endpoint: url,
                source,
            }
        })
    }
}

fn status_error(endpoint: String, status: StatusCode, body: String) -> QuotaError {
    match status {
        StatusCode::NOT_FOUND => QuotaError::EndpointNotFound { endpoint },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => QuotaError::AccessDenied {
            endpoint,
            status: status.as_u16(),
        },
        _ => QuotaError::UnexpectedStatus {
            endpoint,
            status: status.as_u16(),
            body,
        },
    }
}

impl QuotaSource for ApiKeyQuotaClient {
    type Error = QuotaError;

    fn id(&self) -> &str {
        "anthropic.api_key"
    }

    fn account_kind(&self) -> AccountKind {
        AccountKind::ApiKey
    }

    fn fetch_quota(
        &self,
        ctx: &FetchContext,
        access_token: &str,
    ) -> impl Future<Output = Result<QuotaInfo, QuotaError>> + Send {
        ApiKeyQuotaClient::fetch_quota(self, ctx, access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiKeyClientConfig::default();
        assert_eq!(config.base_url, CONSOLE_API_BASE_URL);
        assert_eq!(
            config.endpoints,
            vec![
                "/organization/usage",
                "/organization/quota",
                "/account/usage",
                "/usage"
            ]
        );
        assert_eq!(config.api_version, "2023-06-01");
    }

    #[test]
    fn test_endpoint_url_trims_slash() {
        let config = ApiKeyClientConfig::default().with_base_url("http://localhost:1234/");
        assert_eq!(config.endpoint_url("/usage"), "http://localhost:1234/usage");
    }

    #[test]
    fn test_status_error_mapping() {
        let e = status_error("u".into(), StatusCode::NOT_FOUND, String::new());
        assert!(matches!(e, QuotaError::EndpointNotFound { .. }));

        let e = status_error("u".into(), StatusCode::FORBIDDEN, String::new());
        assert!(matches!(e, QuotaError::AccessDenied { status: 403, .. }));

        let e = status_error("u".into(), StatusCode::BAD_GATEWAY, "oops".into());
        assert!(matches!(e, QuotaError::UnexpectedStatus { status: 502, ref body, .. } if body == "oops"));
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: ApiKeyClientConfig =
            serde_json::from_str(r#"{"base_url": "http://mock"}"#).unwrap();
        assert_eq!(config.base_url, "http://mock");
        assert_eq!(config.endpoints.len(), 4);
    }
}
