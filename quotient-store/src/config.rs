//! Configuration management.

use quotient_fetch::HttpSettings;
use quotient_providers::{ApiKeyClientConfig, OAuthClientConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::StoreError;
use crate::persistence::{
    TOKEN_DIR_ENV, default_config_path, default_token_dir, load_json, save_json,
};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Anthropic client settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,
    /// Token storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// General settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level when `--verbose` is not given.
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Default request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Proxy for all outbound requests.
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// Default `User-Agent`.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            proxy_url: None,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    /// Converts to client construction settings.
    pub fn to_settings(&self) -> HttpSettings {
        let mut settings = HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            proxy_url: self.proxy_url.clone().filter(|p| !p.trim().is_empty()),
            ..HttpSettings::default()
        };
        if let Some(agent) = self.user_agent.as_ref().filter(|a| !a.trim().is_empty()) {
            settings.user_agent.clone_from(agent);
        }
        settings
    }
}

/// Anthropic client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Administrative (API-key) client.
    #[serde(default)]
    pub api_key: ApiKeyClientConfig,
    /// OAuth usage client.
    #[serde(default)]
    pub oauth: OAuthClientConfig,
}

/// Token storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding token files.
    #[serde(default)]
    pub token_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolves the token directory.
    ///
    /// `QUOTIENT_TOKEN_DIR` wins over the configured value, which wins over
    /// the default.
    pub fn resolve_token_dir(&self) -> PathBuf {
        self.resolve_token_dir_with(std::env::var_os(TOKEN_DIR_ENV).map(PathBuf::from))
    }

    fn resolve_token_dir_with(&self, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| self.token_dir.clone())
            .unwrap_or_else(default_token_dir)
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the file cannot be read,
    /// [`StoreError::Serialization`] if it is not valid config JSON, and
    /// [`StoreError::Config`] if it fails [`Config::validate`].
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !tokio::fs::try_exists(path).await? {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config: Config = load_json(path).await?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to a specific path.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the file or its parent directory cannot be
    /// written.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks that the configured clients can actually be built.
    ///
    /// # Errors
    ///
    /// [`StoreError::Config`] naming the first invalid field: a zero
    /// timeout, an empty or malformed endpoint list, or an unparseable URL.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.http.timeout_secs == 0 {
            return Err(StoreError::Config("http.timeout_secs must be positive".into()));
        }
        if self.anthropic.oauth.timeout_secs == 0 {
            return Err(StoreError::Config(
                "anthropic.oauth.timeout_secs must be positive".into(),
            ));
        }
        if self.anthropic.api_key.endpoints.is_empty() {
            return Err(StoreError::Config(
                "anthropic.api_key.endpoints must not be empty".into(),
            ));
        }
        if let Some(path) = self
            .anthropic
            .api_key
            .endpoints
            .iter()
            .find(|p| !p.starts_with('/'))
        {
            return Err(StoreError::Config(format!(
                "endpoint path {path:?} must start with '/'"
            )));
        }

        check_url("anthropic.api_key.base_url", &self.anthropic.api_key.base_url)?;
        check_url("anthropic.oauth.usage_url", &self.anthropic.oauth.usage_url)?;
        if let Some(proxy) = self.http.proxy_url.as_deref().filter(|p| !p.trim().is_empty()) {
            check_url("http.proxy_url", proxy)?;
        }
        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<(), StoreError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| StoreError::Config(format!("{field} is not a valid URL ({value}): {e}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.general.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_sparse_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"http": {"proxy_url": "socks5://127.0.0.1:1080"}}"#).unwrap();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.anthropic.api_key.endpoints.len(), 4);
        assert_eq!(
            config.http.to_settings().proxy_url.as_deref(),
            Some("socks5://127.0.0.1:1080")
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.anthropic.api_key.endpoints.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.anthropic.oauth.usage_url = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.anthropic.api_key.endpoints = vec!["usage".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_user_agent_override() {
        let http = HttpConfig {
            user_agent: Some("custom/1.0".into()),
            ..HttpConfig::default()
        };
        assert_eq!(http.to_settings().user_agent, "custom/1.0");
        assert_ne!(HttpConfig::default().to_settings().user_agent, "");
    }

    #[test]
    fn test_token_dir_precedence() {
        let storage = StorageConfig {
            token_dir: Some(PathBuf::from("/configured")),
        };
        assert_eq!(
            storage.resolve_token_dir_with(Some(PathBuf::from("/env"))),
            PathBuf::from("/env")
        );
        assert_eq!(
            storage.resolve_token_dir_with(None),
            PathBuf::from("/configured")
        );
        assert_eq!(
            StorageConfig::default().resolve_token_dir_with(Some(PathBuf::new())),
            default_token_dir()
        );
    }
}
