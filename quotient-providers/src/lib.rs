// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotient Providers
//!
//! Upstream quota clients for the Quotient workspace.
//!
//! The [`anthropic`] module implements both Anthropic account surfaces:
//!
//! | Account kind | Client | Endpoint(s) | Result fields |
//! |--------------|--------|-------------|---------------|
//! | API key / organization | [`ApiKeyQuotaClient`] | four Console paths, probed in order | monthly/used/remaining tokens |
//! | OAuth | [`OAuthUsageClient`] | `api/oauth/usage` | 5h / 7d / 7d Sonnet utilization |
//!
//! [`QuotaFetcher`] is the entry point for callers holding a stored
//! credential: it validates input, dispatches on the account kind, and fills
//! the account email from the credential when upstream omits it.
//!
//! ## Usage
//!
//! ```ignore
//! use quotient_core::Credential;
//! use quotient_fetch::FetchContext;
//! use quotient_providers::QuotaFetcher;
//!
//! let fetcher = QuotaFetcher::with_defaults()?;
//! let credential = Credential::from_token(token).with_email("me@example.com");
//! let quota = fetcher.fetch(&FetchContext::new(), Some(&credential)).await?;
//! println!("{:.1}% used", quota.quota_percentage);
//! ```

pub mod anthropic;
pub mod source;

pub use anthropic::{
    ApiKeyClientConfig, ApiKeyQuotaClient, OAuthClientConfig, OAuthUsageClient,
    OAuthUsageResponse, QuotaError, QuotaFetcher, QuotaResponse,
};
pub use source::QuotaSource;
