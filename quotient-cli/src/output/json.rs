//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use quotient_core::{AccountKind, QuotaInfo};
use quotient_store::StoredCredential;
use serde::Serialize;

use super::AccountReport;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one queried account.
#[derive(Debug, Serialize)]
pub struct AccountOutput<'a> {
    pub account: &'a str,
    pub kind: AccountKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<&'a QuotaInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> From<&'a AccountReport> for AccountOutput<'a> {
    fn from(report: &'a AccountReport) -> Self {
        Self {
            account: &report.label,
            kind: report.kind,
            quota: report.result.as_ref().ok(),
            error: report.result.as_ref().err().map(String::as_str),
        }
    }
}

/// JSON output for one stored account. Carries no token material.
#[derive(Debug, Serialize)]
pub struct AccountInfoOutput {
    pub label: String,
    pub kind: AccountKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
    pub path: String,
}

impl AccountInfoOutput {
    /// Builds the listing entry for `stored` as of `now`.
    pub fn from_stored(stored: &StoredCredential, now: DateTime<Utc>) -> Self {
        Self {
            label: stored.label().to_string(),
            kind: stored.credential.kind,
            email: stored.credential.cached_email().map(str::to_string),
            expires_at: stored.expires_at,
            expired: stored.is_expired_at(now),
            path: stored.path.display().to_string(),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats quota reports: a single object for one account, an array
    /// otherwise.
    pub fn format_reports(&self, reports: &[AccountReport]) -> Result<String> {
        let outputs: Vec<AccountOutput<'_>> = reports.iter().map(AccountOutput::from).collect();

        if outputs.len() == 1 {
            self.format(&outputs[0])
        } else {
            self.format(&outputs)
        }
    }
}
