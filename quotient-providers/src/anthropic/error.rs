//! Quota retrieval error types.

use quotient_fetch::HttpError;
use thiserror::Error;

/// Errors from Anthropic quota retrieval.
///
/// Every upstream-facing variant names the endpoint it came from.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// No credential was supplied.
    #[error("token storage is missing")]
    MissingCredential,

    /// The access token is empty or whitespace.
    #[error("access token is empty")]
    EmptyAccessToken,

    /// The access token cannot be sent as an HTTP header value.
    #[error("access token is not a valid header value: {reason}")]
    InvalidAccessToken {
        /// Why the header was rejected.
        reason: String,
    },

    /// Network, timeout or cancellation failure.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint URL.
        endpoint: String,
        /// Underlying transport error.
        #[source]
        source: HttpError,
    },

    /// The administrative endpoint answered 404.
    #[error(
        "quota API endpoint not found ({endpoint}) - this account may not have access to \
         organization quota information (individual/free accounts don't support quota queries)"
    )]
    EndpointNotFound {
        /// Endpoint URL.
        endpoint: String,
    },

    /// The administrative endpoint answered 401 or 403.
    #[error(
        "access denied ({endpoint}, HTTP {status}) - this token may not have permission to \
         view quota information"
    )]
    AccessDenied {
        /// Endpoint URL.
        endpoint: String,
        /// 401 or 403.
        status: u16,
    },

    /// The OAuth usage endpoint answered 403.
    #[error("access forbidden ({endpoint}) - this account may use a setup token instead of OAuth")]
    OAuthForbidden {
        /// Endpoint URL.
        endpoint: String,
    },

    /// The OAuth usage endpoint answered 401.
    #[error("authentication failed ({endpoint}) - token may be invalid or expired")]
    OAuthUnauthorized {
        /// Endpoint URL.
        endpoint: String,
    },

    /// Any other non-200 status.
    #[error("{endpoint} returned status {status}: {body}")]
    UnexpectedStatus {
        /// Endpoint URL.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The body was not a JSON object.
    #[error("failed to parse response from {endpoint}: {source}")]
    Parse {
        /// Endpoint URL.
        endpoint: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The API-key client has an empty endpoint list.
    #[error("no quota endpoints configured")]
    NoEndpointsConfigured,

    /// The HTTP client could not be created.
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] HttpError),
}

impl QuotaError {
    /// Returns true for input rejected before any network call.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential | Self::EmptyAccessToken | Self::InvalidAccessToken { .. }
        )
    }

    /// Maps a request header build failure.
    ///
    /// A rejected `Authorization` value is the caller's token; anything else
    /// is a client configuration problem.
    pub(super) fn from_header_error(error: HttpError) -> Self {
        match error {
            HttpError::InvalidHeader { name, reason } if name.eq_ignore_ascii_case("authorization") => {
                Self::InvalidAccessToken { reason }
            }
            other => Self::Client(other),
        }
    }

    /// Returns true when upstream rejected the token itself.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied { .. } | Self::OAuthForbidden { .. } | Self::OAuthUnauthorized { .. }
        )
    }

    /// Returns true if the caller's context was cancelled or expired.
    pub fn is_context_done(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_context_done())
    }

    /// The HTTP status upstream answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::EndpointNotFound { .. } => Some(404),
            Self::OAuthForbidden { .. } => Some(403),
            Self::OAuthUnauthorized { .. } => Some(401),
            Self::AccessDenied { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// The endpoint this error came from, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Transport { endpoint, .. }
            | Self::EndpointNotFound { endpoint }
            | Self::AccessDenied { endpoint, .. }
            | Self::OAuthForbidden { endpoint }
            | Self::OAuthUnauthorized { endpoint }
            | Self::UnexpectedStatus { endpoint, .. }
            | Self::Parse { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }
}
