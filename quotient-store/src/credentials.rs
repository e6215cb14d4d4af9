//! Read-only access to stored account tokens.
//!
//! Tokens live as one JSON file per account in a token directory. This
//! module only reads them; refresh and persistence belong to the login flow
//! that wrote them.

use chrono::{DateTime, Utc};
use quotient_core::{AccountKind, Credential};
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

use crate::error::StoreError;

/// `type` values that identify an Anthropic token file.
const ANTHROPIC_TYPES: [&str; 2] = ["claude", "anthropic"];

// ============================================================================
// Token Record
// ============================================================================

/// On-disk token file.
#[derive(Clone, Default, Deserialize)]
pub struct TokenRecord {
    /// Access token.
    #[serde(default)]
    pub access_token: String,
    /// Refresh token. Never used here.
    #[serde(default)]
    pub refresh_token: String,
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// Provider tag (`"claude"` for Anthropic accounts).
    #[serde(default, rename = "type")]
    pub provider: String,
    /// Explicit account kind; inferred from the token when absent.
    #[serde(default)]
    pub account_kind: Option<AccountKind>,
    /// Access token expiry (RFC 3339).
    #[serde(default)]
    pub expired: Option<String>,
}

impl TokenRecord {
    /// Returns true if the file belongs to an Anthropic account.
    ///
    /// Files without a `type` are assumed to.
    pub fn is_anthropic(&self) -> bool {
        let provider = self.provider.trim();
        provider.is_empty() || ANTHROPIC_TYPES.iter().any(|t| provider.eq_ignore_ascii_case(t))
    }

    /// Parsed expiry, if present and well-formed.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.expired.as_deref()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// The account kind, explicit or inferred from the token prefix.
    pub fn kind(&self) -> AccountKind {
        self.account_kind
            .unwrap_or_else(|| AccountKind::infer_from_token(&self.access_token))
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("email", &self.email)
            .field("provider", &self.provider)
            .field("account_kind", &self.account_kind)
            .field("expired", &self.expired)
            .finish()
    }
}

// ============================================================================
// Stored Credential
// ============================================================================

/// A credential together with where it was read from.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    /// The token file.
    pub path: PathBuf,
    /// The credential, labelled with the file stem.
    pub credential: Credential,
    /// Access token expiry, if recorded.
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    fn from_record(path: &Path, record: TokenRecord) -> Self {
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = record.kind();
        let expires_at = record.expires_at();

        let mut credential = Credential::new(record.access_token, kind).with_label(label);
        if !record.email.trim().is_empty() {
            credential = credential.with_email(record.email.trim());
        }

        Self {
            path: path.to_path_buf(),
            credential,
            expires_at,
        }
    }

    /// Display label (file stem).
    pub fn label(&self) -> &str {
        self.credential.label.as_deref().unwrap_or_default()
    }

    /// Returns true if the recorded expiry is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

// ============================================================================
// Token Store
// ============================================================================

/// Source of stored credentials.
pub trait TokenStore: Send + Sync {
    /// Lists every usable credential.
    fn list(&self) -> impl Future<Output = Result<Vec<StoredCredential>, StoreError>> + Send;
}

/// Token store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    /// Creates a store over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The token directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads a single token file.
    ///
    /// # Errors
    ///
    /// IO and JSON errors propagate; a non-Anthropic file is
    /// [`StoreError::InvalidToken`].
    pub async fn load(path: &Path) -> Result<StoredCredential, StoreError> {
        let record = read_record(path).await?;
        if !record.is_anthropic() {
            return Err(StoreError::InvalidToken {
                path: path.to_path_buf(),
                reason: format!("not an Anthropic token (type {:?})", record.provider),
            });
        }
        Ok(StoredCredential::from_record(path, record))
    }

    async fn token_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Err(StoreError::TokenDirNotFound(self.dir.clone()));
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|e| e == "json");
            if is_json && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl TokenStore for FileTokenStore {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn list(&self) -> Result<Vec<StoredCredential>, StoreError> {
        let mut credentials = Vec::new();

        for path in self.token_files().await? {
            match read_record(&path).await {
                Ok(record) if record.is_anthropic() => {
                    credentials.push(StoredCredential::from_record(&path, record));
                }
                Ok(record) => {
                    debug!(path = %path.display(), provider = %record.provider, "Skipping non-Anthropic token file");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable token file");
                }
            }
        }

        debug!(count = credentials.len(), "Listed stored credentials");
        Ok(credentials)
    }
}

async fn read_record(path: &Path) -> Result<TokenRecord, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| StoreError::InvalidToken {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
