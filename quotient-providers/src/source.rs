//! Quota source trait.
//!
//! A source turns an access token into a [`QuotaInfo`] for one account
//! kind. The facade holds one source per kind and dispatches between them.

use std::future::Future;

use quotient_core::{AccountKind, QuotaInfo};
use quotient_fetch::FetchContext;

/// A client able to retrieve quota for one account kind.
///
/// ## Implementing a Source
///
/// ```ignore
/// struct FixedSource(QuotaInfo);
///
/// impl QuotaSource for FixedSource {
///     type Error = QuotaError;
///
///     fn id(&self) -> &str {
///         "test.fixed"
///     }
///
///     fn account_kind(&self) -> AccountKind {
///         AccountKind::OAuth
///     }
///
///     async fn fetch_quota(&self, _ctx: &FetchContext, _token: &str) -> Result<QuotaInfo, QuotaError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait QuotaSource: Send + Sync {
    /// Error returned when retrieval fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Unique identifier (e.g. `"anthropic.oauth"`).
    fn id(&self) -> &str;

    /// The account kind this source serves.
    fn account_kind(&self) -> AccountKind;

    /// Retrieves quota for `access_token`, honoring `ctx`.
    fn fetch_quota(
        &self,
        ctx: &FetchContext,
        access_token: &str,
    ) -> impl Future<Output = Result<QuotaInfo, Self::Error>> + Send;
}
