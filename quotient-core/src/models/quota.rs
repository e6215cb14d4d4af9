//! The canonical quota record.
//!
//! Every retrieval path (API-key probing, OAuth usage, tolerant fallback
//! parsing) produces a [`QuotaInfo`]. The record carries two field groups:
//!
//! - **Absolute quota** (API-key accounts): monthly/used/remaining token
//!   counts plus a derived percentage.
//! - **Rolling windows** (OAuth accounts): 5-hour, 7-day and 7-day Sonnet
//!   utilization percentages with their reset times.
//!
//! Exactly one group is populated per record; the other keeps zero values.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Plan type tag reserved for rolling-window (OAuth) accounts.
pub const OAUTH_PLAN_TYPE: &str = "oauth";

/// Utilization above this percentage counts as approaching the limit.
const APPROACHING_LIMIT_PERCENT: f64 = 80.0;

/// Computes `used / monthly * 100`, or `None` when there is no quota.
pub fn usage_percentage(used: i64, monthly: i64) -> Option<f64> {
    if monthly > 0 {
        #[allow(clippy::cast_precision_loss)]
        Some(used as f64 / monthly as f64 * 100.0)
    } else {
        None
    }
}

/// Normalized quota information for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaInfo {
    /// Organization UUID.
    #[serde(default)]
    pub organization_id: String,
    /// Organization display name.
    #[serde(default)]
    pub organization_name: String,

    /// Monthly quota in tokens.
    #[serde(default)]
    pub monthly_quota: i64,
    /// Tokens used this month.
    #[serde(default)]
    pub used_quota: i64,
    /// Tokens remaining this month.
    #[serde(default)]
    pub remaining_quota: i64,
    /// Usage percentage (0-100).
    #[serde(default)]
    pub quota_percentage: f64,
    /// Next reset date, as reported upstream.
    #[serde(default)]
    pub quota_reset_date: String,
    /// Next reset as epoch seconds. Serialized as `null` when unknown.
    #[serde(default)]
    pub quota_reset_time: Option<i64>,

    /// 5-hour window utilization (0-100).
    #[serde(default)]
    pub five_hour_utilization: f64,
    /// 5-hour window reset time.
    #[serde(default)]
    pub five_hour_resets_at: String,
    /// 7-day window utilization (0-100).
    #[serde(default)]
    pub seven_day_utilization: f64,
    /// 7-day window reset time.
    #[serde(default)]
    pub seven_day_resets_at: String,
    /// 7-day Sonnet window utilization (0-100).
    #[serde(default, rename = "seven_day_sonnet_util")]
    pub seven_day_sonnet_utilization: f64,
    /// 7-day Sonnet window reset time.
    #[serde(default, rename = "seven_day_sonnet_resets")]
    pub seven_day_sonnet_resets_at: String,

    /// Requests per minute.
    #[serde(default)]
    pub requests_limit: i64,
    /// Remaining requests in the current minute.
    #[serde(default)]
    pub requests_remaining: i64,

    /// Account tier (e.g. "free", "pro", "team", "oauth").
    #[serde(default)]
    pub plan_type: String,

    /// When this record was built. Never parsed from upstream.
    pub last_updated: DateTime<Utc>,
    /// Account email.
    #[serde(default)]
    pub email: String,
}

impl QuotaInfo {
    /// Creates an empty record stamped with the current time.
    pub fn new() -> Self {
        Self {
            organization_id: String::new(),
            organization_name: String::new(),
            monthly_quota: 0,
            used_quota: 0,
            remaining_quota: 0,
            quota_percentage: 0.0,
            quota_reset_date: String::new(),
            quota_reset_time: None,
            five_hour_utilization: 0.0,
            five_hour_resets_at: String::new(),
            seven_day_utilization: 0.0,
            seven_day_resets_at: String::new(),
            seven_day_sonnet_utilization: 0.0,
            seven_day_sonnet_resets_at: String::new(),
            requests_limit: 0,
            requests_remaining: 0,
            plan_type: String::new(),
            last_updated: Utc::now(),
            email: String::new(),
        }
    }

    /// Recomputes `quota_percentage` from used/monthly when a quota exists.
    pub fn recompute_percentage(&mut self) {
        if let Some(pct) = usage_percentage(self.used_quota, self.monthly_quota) {
            self.quota_percentage = pct;
        }
    }

    /// Fills `remaining_quota` from monthly - used when upstream omitted it.
    pub fn derive_remaining(&mut self) {
        if self.remaining_quota == 0 && self.monthly_quota > 0 && self.used_quota > 0 {
            self.remaining_quota = self.monthly_quota - self.used_quota;
        }
    }

    /// Copies `email` in when the record has none.
    #[must_use]
    pub fn with_email_fallback(mut self, email: Option<&str>) -> Self {
        if self.email.is_empty() {
            if let Some(email) = email.filter(|e| !e.is_empty()) {
                self.email = email.to_string();
            }
        }
        self
    }

    /// Returns true if this record came from a rolling-window (OAuth) account.
    pub fn is_rolling_window(&self) -> bool {
        self.plan_type == OAUTH_PLAN_TYPE
    }

    /// Highest utilization across the populated windows.
    ///
    /// For absolute-quota records this is just `quota_percentage`.
    pub fn peak_utilization(&self) -> f64 {
        if self.is_rolling_window() {
            self.five_hour_utilization
                .max(self.seven_day_utilization)
                .max(self.seven_day_sonnet_utilization)
        } else {
            self.quota_percentage
        }
    }

    /// Returns true if any window is at or over 100%.
    pub fn is_exhausted(&self) -> bool {
        self.peak_utilization() >= 100.0
    }

    /// Returns true if any window is above 80%.
    pub fn is_approaching_limit(&self) -> bool {
        self.peak_utilization() > APPROACHING_LIMIT_PERCENT
    }

    /// The next reset as a timestamp, if upstream reported one.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.quota_reset_time
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Validates percentages and token counts.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let percentages = [
            ("quota_percentage", self.quota_percentage),
            ("five_hour_utilization", self.five_hour_utilization),
            ("seven_day_utilization", self.seven_day_utilization),
            ("seven_day_sonnet_utilization", self.seven_day_sonnet_utilization),
        ];
        for (name, value) in percentages {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(CoreError::InvalidData(format!(
                    "{name} must be within 0-100, got {value}"
                )));
            }
        }

        let counts = [
            ("monthly_quota", self.monthly_quota),
            ("used_quota", self.used_quota),
        ];
        for (name, value) in counts {
            if value < 0 {
                return Err(CoreError::InvalidData(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for QuotaInfo {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
