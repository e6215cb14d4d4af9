//! Account credentials as seen by the quota subsystem.
//!
//! Credentials are owned and persisted by the token storage collaborator.
//! Quota retrieval only reads them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Token prefixes issued for Console API keys (standard and admin).
const API_KEY_PREFIXES: [&str; 2] = ["sk-ant-api", "sk-ant-admin"];

// ============================================================================
// Account Kind
// ============================================================================

/// Which upstream surface an account's quota lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Organization/API-key account with an absolute monthly quota.
    #[serde(alias = "api-key", alias = "apikey")]
    ApiKey,
    /// OAuth-issued account with rolling-window utilization.
    #[serde(rename = "oauth", alias = "o_auth")]
    OAuth,
}

impl AccountKind {
    /// Classifies a raw token by its prefix.
    ///
    /// Console API keys carry an `sk-ant-api` or `sk-ant-admin` prefix;
    /// everything else is treated as an OAuth access token.
    pub fn infer_from_token(token: &str) -> Self {
        let token = token.trim();
        if API_KEY_PREFIXES.iter().any(|p| token.starts_with(p)) {
            Self::ApiKey
        } else {
            Self::OAuth
        }
    }

    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ApiKey => "API Key",
            Self::OAuth => "OAuth",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for AccountKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "api_key" | "api-key" | "apikey" | "api" => Ok(Self::ApiKey),
            "oauth" => Ok(Self::OAuth),
            other => Err(CoreError::UnknownAccountKind(other.to_string())),
        }
    }
}

// ============================================================================
// Credential
// ============================================================================

/// A stored account credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Access token (OAuth access token or Console API key).
    pub access_token: String,
    /// Account kind.
    pub kind: AccountKind,
    /// Cached account email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Where this credential came from (usually the token file name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Credential {
    /// Creates a credential of an explicit kind.
    pub fn new(access_token: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            access_token: access_token.into(),
            kind,
            email: None,
            label: None,
        }
    }

    /// Creates a credential, inferring the kind from the token prefix.
    pub fn from_token(access_token: impl Into<String>) -> Self {
        let access_token = access_token.into();
        let kind = AccountKind::infer_from_token(&access_token);
        Self::new(access_token, kind)
    }

    /// Sets the cached email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The token with surrounding whitespace removed.
    pub fn token(&self) -> &str {
        self.access_token.trim()
    }

    /// Returns true if the token is non-blank.
    pub fn has_token(&self) -> bool {
        !self.token().is_empty()
    }

    /// The cached email, if any and non-empty.
    pub fn cached_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("kind", &self.kind)
            .field("email", &self.email)
            .field("label", &self.label)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
