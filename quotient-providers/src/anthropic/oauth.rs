//! OAuth usage client.
//!
//! OAuth accounts have no absolute token quota. The usage endpoint reports
//! rolling-window utilization as fractions, which are scaled to percent.

use std::time::Duration;

use chrono::DateTime;
use quotient_core::{AccountKind, OAUTH_PLAN_TYPE, QuotaInfo};
use quotient_fetch::{FetchContext, HttpClient, build_headers};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::QuotaError;
use super::parser::decode_object;
use crate::source::QuotaSource;

// ============================================================================
// Constants
// ============================================================================

/// OAuth usage endpoint.
pub const OAUTH_USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";

/// Beta header required by the OAuth endpoints.
pub const OAUTH_BETA_HEADER: &str = "oauth-2025-04-20";

/// User agent the OAuth endpoints expect.
pub const OAUTH_USER_AGENT: &str = "claude-cli/2.0.53 (external, cli)";

const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USAGE_WINDOWS: [&str; 3] = ["five_hour", "seven_day", "seven_day_sonnet"];

// ============================================================================
// Configuration
// ============================================================================

/// Settings for [`OAuthUsageClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthClientConfig {
    /// Usage endpoint URL.
    pub usage_url: String,
    /// Value of the `anthropic-beta` header.
    pub beta: String,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Value of the `Accept-Language` header.
    pub accept_language: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OAuthClientConfig {
    fn default() -> Self {
        Self {
            usage_url: OAUTH_USAGE_URL.to_string(),
            beta: OAUTH_BETA_HEADER.to_string(),
            user_agent: OAUTH_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OAuthClientConfig {
    /// Replaces the usage URL.
    #[must_use]
    pub fn with_usage_url(mut self, url: impl Into<String>) -> Self {
        self.usage_url = url.into();
        self
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Body of the OAuth usage endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthUsageResponse {
    /// Five-hour window.
    #[serde(default)]
    pub five_hour: Option<UsageWindow>,
    /// Seven-day window.
    #[serde(default)]
    pub seven_day: Option<UsageWindow>,
    /// Seven-day Sonnet window.
    #[serde(default)]
    pub seven_day_sonnet: Option<UsageWindow>,
}

/// One rolling window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageWindow {
    /// Fraction used, 0.0 to 1.0.
    #[serde(default)]
    pub utilization: Option<f64>,
    /// When the window resets (RFC 3339).
    #[serde(default)]
    pub resets_at: Option<String>,
}

impl UsageWindow {
    fn percent(window: Option<&Self>) -> f64 {
        window.and_then(|w| w.utilization).unwrap_or(0.0) * 100.0
    }

    fn resets(window: Option<&Self>) -> String {
        window
            .and_then(|w| w.resets_at.clone())
            .unwrap_or_default()
    }
}

impl OAuthUsageResponse {
    /// Decodes a usage body. Only a JSON object is accepted.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, a non-object body, or an array-shaped window.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        decode_object(body, &USAGE_WINDOWS)
    }

    /// Converts to a [`QuotaInfo`].
    ///
    /// The five-hour window doubles as the headline percentage and reset.
    pub fn to_quota_info(&self) -> QuotaInfo {
        let five_hour = self.five_hour.as_ref();
        let seven_day = self.seven_day.as_ref();
        let sonnet = self.seven_day_sonnet.as_ref();

        let mut quota = QuotaInfo::new();
        quota.plan_type = OAUTH_PLAN_TYPE.to_string();

        quota.five_hour_utilization = UsageWindow::percent(five_hour);
        quota.five_hour_resets_at = UsageWindow::resets(five_hour);
        quota.seven_day_utilization = UsageWindow::percent(seven_day);
        quota.seven_day_resets_at = UsageWindow::resets(seven_day);
        quota.seven_day_sonnet_utilization = UsageWindow::percent(sonnet);
        quota.seven_day_sonnet_resets_at = UsageWindow::resets(sonnet);

        quota.quota_percentage = quota.five_hour_utilization;
        quota.quota_reset_date.clone_from(&quota.five_hour_resets_at);
        quota.quota_reset_time = DateTime::parse_from_rfc3339(&quota.five_hour_resets_at)
            .ok()
            .map(|t| t.timestamp());
        quota
    }
}

// ============================================================================
// Client
// ============================================================================

/// Queries the OAuth usage endpoint.
#[derive(Debug, Clone)]
pub struct OAuthUsageClient {
    http: HttpClient,
    config: OAuthClientConfig,
}

impl OAuthUsageClient {
    /// Creates a client on a shared HTTP client.
    pub fn new(http: HttpClient, config: OAuthClientConfig) -> Self {
        Self { http, config }
    }

    /// Creates a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Client`] if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, QuotaError> {
        let http = HttpClient::new().map_err(QuotaError::Client)?;
        Ok(Self::new(http, OAuthClientConfig::default()))
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    /// Fetches rolling-window utilization for an OAuth access token.
    ///
    /// # Errors
    ///
    /// 401 and 403 map to dedicated variants; any other non-200 carries
    /// the status and body.
    #[instrument(skip(self, ctx, access_token))]
    pub async fn fetch_quota(
        &self,
        ctx: &FetchContext,
        access_token: &str,
    ) -> Result<QuotaInfo, QuotaError> {
        let token = access_token.trim();
        if token.is_empty() {
            return Err(QuotaError::EmptyAccessToken);
        }

        let url = self.config.usage_url.as_str();
        let bearer = format!("Bearer {token}");
        let headers = build_headers([
            ("Authorization", bearer.as_str()),
            ("anthropic-beta", self.config.beta.as_str()),
            ("User-Agent", self.config.user_agent.as_str()),
            ("Accept-Language", self.config.accept_language.as_str()),
            ("Content-Type", "application/json"),
            ("Accept", "application/json"),
        ])
        .map_err(QuotaError::from_header_error)?;

        let response = self
            .http
            .get_with_timeout(ctx, url, headers, self.config.timeout())
            .await
            .map_err(|source| QuotaError::Transport {
                endpoint: url.to_string(),
                source,
            })?;

        if !response.is_ok() {
            debug!(status = %response.status, body = %response.body, "OAuth usage request rejected");
            let endpoint = url.to_string();
            return Err(match response.status {
                StatusCode::FORBIDDEN => QuotaError::OAuthForbidden { endpoint },
                StatusCode::UNAUTHORIZED => QuotaError::OAuthUnauthorized { endpoint },
                status => QuotaError::UnexpectedStatus {
                    endpoint,
                    status: status.as_u16(),
                    body: response.body,
                },
            });
        }

        let quota = OAuthUsageResponse::parse(&response.body)
            .map_err(|source| QuotaError::Parse {
                endpoint: url.to_string(),
                source,
            })?
            .to_quota_info();

        debug!(
            five_hour = quota.five_hour_utilization,
            seven_day = quota.seven_day_utilization,
            seven_day_sonnet = quota.seven_day_sonnet_utilization,
            "Retrieved OAuth usage"
        );
        Ok(quota)
    }
}

impl QuotaSource for OAuthUsageClient {
    type Error = QuotaError;

    fn id(&self) -> &str {
        "anthropic.oauth"
    }

    fn account_kind(&self) -> AccountKind {
        AccountKind::OAuth
    }

    fn fetch_quota(
        &self,
        ctx: &FetchContext,
        access_token: &str,
    ) -> impl Future<Output = Result<QuotaInfo, QuotaError>> + Send {
        OAuthUsageClient::fetch_quota(self, ctx, access_token)
    }
}
