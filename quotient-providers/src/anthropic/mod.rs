//! Anthropic quota retrieval.
//!
//! # Account kinds
//!
//! - **API key / organization**: absolute monthly token quota, read from the
//!   Console API. The exact path varies by account tier, so four candidate
//!   paths are probed in order.
//! - **OAuth**: rolling five-hour and seven-day windows from a single
//!   usage endpoint.

mod api_key;
mod error;
mod fetcher;
mod oauth;
mod parser;

pub use api_key::{
    ANTHROPIC_VERSION, ApiKeyClientConfig, ApiKeyQuotaClient, CONSOLE_API_BASE_URL,
    QUOTA_ENDPOINTS,
};
pub use error::QuotaError;
pub use fetcher::QuotaFetcher;
pub use oauth::{
    OAUTH_BETA_HEADER, OAUTH_USAGE_URL, OAUTH_USER_AGENT, OAuthClientConfig, OAuthUsageClient,
    OAuthUsageResponse, UsageWindow,
};
pub use parser::{
    AccountInfo, OrganizationInfo, QuotaResponse, RateLimitInfo, UsageInfo,
    parse_quota_response, parse_quota_structured, parse_quota_tolerant,
};
