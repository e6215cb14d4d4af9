//! HTTP client that honors a [`FetchContext`].
//!
//! This module provides a wrapped reqwest client that adds:
//! - Request/response tracing
//! - Explicit construction settings (timeout, user agent, proxy)
//! - Cancellation and deadline handling through the caller's context
//! - Whole-body reads, so callers get status and body in one value

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::context::FetchContext;
use crate::error::HttpError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for Quotient.
const USER_AGENT: &str = concat!("Quotient/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Settings
// ============================================================================

/// Construction-time settings for [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Default `User-Agent`. Individual requests may override it.
    pub user_agent: String,
    /// Outbound proxy URL (http, https or socks).
    pub proxy_url: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
            proxy_url: None,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for HTTP 200.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and context-aware requests.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_settings(&HttpSettings::default())
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` if the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        Self::with_settings(&HttpSettings {
            timeout,
            ..HttpSettings::default()
        })
    }

    /// Creates a new HTTP client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Build` for an unusable proxy URL or TLS backend.
    pub fn with_settings(settings: &HttpSettings) -> Result<Self, HttpError> {
        let mut builder = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str());

        if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HttpError::Build(format!("invalid proxy {proxy_url}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            inner,
            timeout: settings.timeout,
        })
    }

    /// The client-wide request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a GET request with custom headers.
    ///
    /// # Errors
    ///
    /// Returns an `HttpError` for transport failures, timeouts, or when the
    /// context is cancelled or expires. Non-2xx statuses are not errors.
    #[instrument(skip(self, ctx, headers), fields(url = %url))]
    pub async fn get_with_headers(
        &self,
        ctx: &FetchContext,
        url: &str,
        headers: HeaderMap,
    ) -> Result<HttpResponse, HttpError> {
        self.send_get(ctx, url, headers, None).await
    }

    /// Performs a GET request with a per-request timeout overriding the
    /// client-wide one.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::get_with_headers`].
    #[instrument(skip(self, ctx, headers), fields(url = %url, timeout = ?timeout))]
    pub async fn get_with_timeout(
        &self,
        ctx: &FetchContext,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        self.send_get(ctx, url, headers, Some(timeout)).await
    }

    async fn send_get(
        &self,
        ctx: &FetchContext,
        url: &str,
        headers: HeaderMap,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        let effective_timeout = timeout.unwrap_or(self.timeout);

        debug!("GET request");

        let mut request = self.inner.get(parsed).headers(headers);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse { status, body })
        };

        let response = ctx.run(exchange).await?.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(effective_timeout)
            } else {
                HttpError::Request(e)
            }
        })?;

        debug!(status = %response.status, len = response.body.len(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Header Helpers
// ============================================================================

/// Builds a header map from name/value pairs.
///
/// # Errors
///
/// Returns `HttpError::InvalidHeader` for a name or value that is not valid
/// in an HTTP header.
pub fn build_headers<'a, I>(pairs: I) -> Result<HeaderMap, HttpError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let mut header_value =
            HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        if header_name == reqwest::header::AUTHORIZATION {
            header_value.set_sensitive(true);
        }
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

// ============================================================================
// Tests
// ============================================================================
