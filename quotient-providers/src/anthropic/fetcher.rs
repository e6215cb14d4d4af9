//! Credential-driven quota facade.

use quotient_core::{AccountKind, Credential, QuotaInfo};
use quotient_fetch::{FetchContext, HttpClient, HttpSettings};
use tracing::{info, instrument, warn};

use super::api_key::{ApiKeyClientConfig, ApiKeyQuotaClient};
use super::error::QuotaError;
use super::oauth::{OAuthClientConfig, OAuthUsageClient};
use crate::source::QuotaSource;

/// Fetches quota for a stored credential.
///
/// Validates the credential before any network traffic, dispatches on its
/// account kind, and fills the email from the credential when upstream
/// left it empty.
#[derive(Debug, Clone)]
pub struct QuotaFetcher<A = ApiKeyQuotaClient, O = OAuthUsageClient> {
    api_key: A,
    oauth: O,
}

impl QuotaFetcher {
    /// Creates a fetcher whose clients share one HTTP client.
    pub fn new(http: HttpClient, api_key: ApiKeyClientConfig, oauth: OAuthClientConfig) -> Self {
        Self {
            api_key: ApiKeyQuotaClient::new(http.clone(), api_key),
            oauth: OAuthUsageClient::new(http, oauth),
        }
    }

    /// Creates a fetcher from HTTP settings and client configs.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Client`] if the HTTP client cannot be built.
    pub fn from_settings(
        settings: &HttpSettings,
        api_key: ApiKeyClientConfig,
        oauth: OAuthClientConfig,
    ) -> Result<Self, QuotaError> {
        let http = HttpClient::with_settings(settings).map_err(QuotaError::Client)?;
        Ok(Self::new(http, api_key, oauth))
    }

    /// Creates a fetcher with default endpoints and HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Client`] if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, QuotaError> {
        Self::from_settings(
            &HttpSettings::default(),
            ApiKeyClientConfig::default(),
            OAuthClientConfig::default(),
        )
    }
}

impl<A, O> QuotaFetcher<A, O>
where
    A: QuotaSource<Error = QuotaError>,
    O: QuotaSource<Error = QuotaError>,
{
    /// Creates a fetcher from explicit sources.
    ///
    /// Each source must serve the kind of the slot it is placed in; dispatch
    /// trusts that pairing.
    pub fn with_sources(api_key: A, oauth: O) -> Self {
        debug_assert_eq!(
            api_key.account_kind(),
            AccountKind::ApiKey,
            "API-key slot holds a {} source",
            api_key.id()
        );
        debug_assert_eq!(
            oauth.account_kind(),
            AccountKind::OAuth,
            "OAuth slot holds a {} source",
            oauth.id()
        );
        Self { api_key, oauth }
    }

    /// Fetches quota for `credential`.
    ///
    /// # Errors
    ///
    /// [`QuotaError::MissingCredential`] for `None` and
    /// [`QuotaError::EmptyAccessToken`] for a blank token, both without a
    /// network call. Otherwise whatever the selected client returns.
    #[instrument(skip(self, ctx, credential))]
    pub async fn fetch(
        &self,
        ctx: &FetchContext,
        credential: Option<&Credential>,
    ) -> Result<QuotaInfo, QuotaError> {
        let credential = credential.ok_or(QuotaError::MissingCredential)?;
        if !credential.has_token() {
            return Err(QuotaError::EmptyAccessToken);
        }

        let quota = self
            .fetch_with_token(ctx, credential.kind, credential.token())
            .await?;
        Ok(quota.with_email_fallback(credential.cached_email()))
    }

    /// Fetches quota for a bare token of a known account kind.
    ///
    /// # Errors
    ///
    /// [`QuotaError::EmptyAccessToken`] for a blank token; otherwise whatever
    /// the selected client returns.
    #[instrument(skip(self, ctx, access_token), fields(kind = %kind))]
    pub async fn fetch_with_token(
        &self,
        ctx: &FetchContext,
        kind: AccountKind,
        access_token: &str,
    ) -> Result<QuotaInfo, QuotaError> {
        if access_token.trim().is_empty() {
            return Err(QuotaError::EmptyAccessToken);
        }

        let (source, result) = match kind {
            AccountKind::ApiKey => (
                self.api_key.id(),
                self.api_key.fetch_quota(ctx, access_token).await,
            ),
            AccountKind::OAuth => (
                self.oauth.id(),
                self.oauth.fetch_quota(ctx, access_token).await,
            ),
        };

        match &result {
            Ok(quota) => info!(
                source,
                percentage = quota.quota_percentage,
                "Quota fetched"
            ),
            Err(e) => warn!(source, error = %e, "Quota fetch failed"),
        }
        result
    }

    /// Returns the API-key source.
    pub fn api_key_source(&self) -> &A {
        &self.api_key
    }

    /// Returns the OAuth source.
    pub fn oauth_source(&self) -> &O {
        &self.oauth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        kind: AccountKind,
        calls: AtomicUsize,
        quota: QuotaInfo,
    }

    impl CountingSource {
        fn new(kind: AccountKind, quota: QuotaInfo) -> Self {
            Self {
                kind,
                calls: AtomicUsize::new(0),
                quota,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl QuotaSource for CountingSource {
        type Error = QuotaError;

        fn id(&self) -> &str {
            "test.counting"
        }

        fn account_kind(&self) -> AccountKind {
            self.kind
        }

        async fn fetch_quota(
            &self,
            _ctx: &FetchContext,
            _access_token: &str,
        ) -> Result<QuotaInfo, QuotaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.quota.clone())
        }
    }

    fn fetcher() -> QuotaFetcher<CountingSource, CountingSource> {
        let mut org = QuotaInfo::new();
        org.organization_name = "Acme".to_string();
        let mut oauth = QuotaInfo::new();
        oauth.plan_type = "oauth".to_string();
        QuotaFetcher::with_sources(
            CountingSource::new(AccountKind::ApiKey, org),
            CountingSource::new(AccountKind::OAuth, oauth),
        )
    }

    #[test]
    fn test_sources_match_their_slots() {
        let fetcher = fetcher();
        assert_eq!(fetcher.api_key_source().account_kind(), AccountKind::ApiKey);
        assert_eq!(fetcher.oauth_source().account_kind(), AccountKind::OAuth);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "API-key slot")]
    fn test_swapped_sources_rejected() {
        let _ = QuotaFetcher::with_sources(
            CountingSource::new(AccountKind::OAuth, QuotaInfo::new()),
            CountingSource::new(AccountKind::OAuth, QuotaInfo::new()),
        );
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let fetcher = fetcher();
        let err = fetcher.fetch(&FetchContext::new(), None).await.unwrap_err();
        assert!(matches!(err, QuotaError::MissingCredential));
        assert_eq!(fetcher.api_key_source().calls(), 0);
        assert_eq!(fetcher.oauth_source().calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_token() {
        let fetcher = fetcher();
        let credential = Credential::new("   ", AccountKind::OAuth);
        let err = fetcher
            .fetch(&FetchContext::new(), Some(&credential))
            .await
            .unwrap_err();
        assert!(matches!(err, QuotaError::EmptyAccessToken));
        assert_eq!(fetcher.oauth_source().calls(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_by_kind() {
        let fetcher = fetcher();
        let ctx = FetchContext::new();

        let quota = fetcher
            .fetch(&ctx, Some(&Credential::new("tok", AccountKind::ApiKey)))
            .await
            .unwrap();
        assert_eq!(quota.organization_name, "Acme");

        let quota = fetcher
            .fetch(&ctx, Some(&Credential::new("tok", AccountKind::OAuth)))
            .await
            .unwrap();
        assert_eq!(quota.plan_type, "oauth");

        assert_eq!(fetcher.api_key_source().calls(), 1);
        assert_eq!(fetcher.oauth_source().calls(), 1);
    }

    #[tokio::test]
    async fn test_email_fallback() {
        let fetcher = fetcher();
        let credential =
            Credential::new("tok", AccountKind::OAuth).with_email("user@example.com");
        let quota = fetcher
            .fetch(&FetchContext::new(), Some(&credential))
            .await
            .unwrap();
        assert_eq!(quota.email, "user@example.com");
    }

    #[tokio::test]
    async fn test_upstream_email_wins() {
        let mut org = QuotaInfo::new();
        org.email = "upstream@example.com".to_string();
        let fetcher = QuotaFetcher::with_sources(
            CountingSource::new(AccountKind::ApiKey, org),
            CountingSource::new(AccountKind::OAuth, QuotaInfo::new()),
        );
        let credential =
            Credential::new("tok", AccountKind::ApiKey).with_email("cached@example.com");
        let quota = fetcher
            .fetch(&FetchContext::new(), Some(&credential))
            .await
            .unwrap();
        assert_eq!(quota.email, "upstream@example.com");
    }
}
