//! Quota response parsing.
//!
//! Administrative quota bodies are decoded in two passes. The structured
//! pass accepts the documented schema exactly; anything it rejects falls
//! through to a tolerant pass that picks individual fields out of a
//! generic JSON map and derives the rest.

use quotient_core::{QuotaInfo, usage_percentage};
use serde::Deserialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Map, Value};
use tracing::debug;

/// Top-level sections of an administrative quota body.
const QUOTA_SECTIONS: [&str; 4] = ["organization", "usage", "rate_limit", "account"];

// ============================================================================
// Structured Schema
// ============================================================================

/// Documented quota response from the administrative endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaResponse {
    /// Organization identity.
    #[serde(default)]
    pub organization: OrganizationInfo,
    /// Token usage for the current period.
    #[serde(default)]
    pub usage: UsageInfo,
    /// Request rate limits.
    #[serde(default)]
    pub rate_limit: RateLimitInfo,
    /// Account details.
    #[serde(default)]
    pub account: AccountInfo,
}

/// Organization section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizationInfo {
    /// Organization UUID.
    #[serde(default)]
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Usage section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageInfo {
    /// Token quota for the period.
    #[serde(default)]
    pub monthly_tokens: i64,
    /// Tokens consumed.
    #[serde(default)]
    pub used_tokens: i64,
    /// Tokens left.
    #[serde(default)]
    pub remaining_tokens: i64,
    /// Reset date as upstream formats it.
    #[serde(default)]
    pub next_reset_date: String,
    /// Reset time as Unix seconds.
    #[serde(default)]
    pub next_reset_unix_time: Option<i64>,
}

/// Rate limit section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitInfo {
    /// Requests allowed per minute.
    #[serde(default)]
    pub requests_per_minute: i64,
    /// Requests left in the current minute.
    #[serde(default)]
    pub requests_remaining: i64,
}

/// Account section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountInfo {
    /// Plan name.
    #[serde(default)]
    pub plan_type: String,
    /// Account email.
    #[serde(default)]
    pub email_address: String,
}

impl QuotaResponse {
    /// Converts to a [`QuotaInfo`], keeping every value as reported.
    pub fn to_quota_info(&self) -> QuotaInfo {
        let mut quota = QuotaInfo::new();
        quota.organization_id.clone_from(&self.organization.uuid);
        quota.organization_name.clone_from(&self.organization.name);
        quota.monthly_quota = self.usage.monthly_tokens;
        quota.used_quota = self.usage.used_tokens;
        quota.remaining_quota = self.usage.remaining_tokens;
        quota.quota_reset_date.clone_from(&self.usage.next_reset_date);
        quota.quota_reset_time = self.usage.next_reset_unix_time;
        quota.requests_limit = self.rate_limit.requests_per_minute;
        quota.requests_remaining = self.rate_limit.requests_remaining;
        quota.plan_type.clone_from(&self.account.plan_type);
        quota.email.clone_from(&self.account.email_address);
        quota.recompute_percentage();
        quota
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Decodes `body` against the documented schema.
///
/// # Errors
///
/// Fails on malformed JSON, unknown fields, or mistyped values.
pub fn parse_quota_structured(body: &str) -> Result<QuotaInfo, serde_json::Error> {
    let response: QuotaResponse = decode_object(body, &QUOTA_SECTIONS)?;
    Ok(response.to_quota_info())
}

/// Decodes `body` into `T`, but only from a JSON object.
///
/// Derived struct decoders also accept JSON arrays positionally, so the
/// root must be an object and none of the named `sections` may be an array.
pub(super) fn decode_object<T: DeserializeOwned>(
    body: &str,
    sections: &[&str],
) -> Result<T, serde_json::Error> {
    let root: Map<String, Value> = serde_json::from_str(body)?;
    if let Some(section) = sections
        .iter()
        .find(|section| root.get(**section).is_some_and(Value::is_array))
    {
        return Err(serde_json::Error::custom(format!(
            "section `{section}` is an array, expected an object"
        )));
    }
    T::deserialize(Value::Object(root))
}

/// Extracts the quota fields it can find from any JSON object.
///
/// Numbers may be integral or fractional; fractional values are truncated.
/// A zero or missing remaining count is derived from monthly and used.
///
/// # Errors
///
/// Fails only if `body` is not a JSON object.
pub fn parse_quota_tolerant(body: &str) -> Result<QuotaInfo, serde_json::Error> {
    let root: Map<String, Value> = serde_json::from_str(body)?;
    let mut quota = QuotaInfo::new();

    if let Some(id) = lookup_str(&root, "organization", "uuid") {
        quota.organization_id = id.to_string();
    }
    if let Some(name) = lookup_str(&root, "organization", "name") {
        quota.organization_name = name.to_string();
    }
    if let Some(monthly) = lookup_tokens(&root, "usage", "monthly_tokens") {
        quota.monthly_quota = monthly;
    }
    if let Some(used) = lookup_tokens(&root, "usage", "used_tokens") {
        quota.used_quota = used;
    }

    if let Some(remaining) = lookup_tokens(&root, "usage", "remaining_tokens") {
        quota.remaining_quota = remaining;
    }
    quota.derive_remaining();

    if let Some(pct) = usage_percentage(quota.used_quota, quota.monthly_quota) {
        quota.quota_percentage = pct;
    }
    Ok(quota)
}

/// Parses an administrative quota body, structured first.
///
/// # Errors
///
/// Fails only if the tolerant pass fails too, i.e. the body is not a JSON
/// object. The error is the tolerant pass's.
pub fn parse_quota_response(body: &str) -> Result<QuotaInfo, serde_json::Error> {
    match parse_quota_structured(body) {
        Ok(quota) => Ok(quota),
        Err(e) => {
            debug!(error = %e, "Structured decode failed, trying tolerant extraction");
            parse_quota_tolerant(body)
        }
    }
}

fn lookup<'a>(root: &'a Map<String, Value>, section: &str, field: &str) -> Option<&'a Value> {
    root.get(section)?.as_object()?.get(field)
}

fn lookup_str<'a>(root: &'a Map<String, Value>, section: &str, field: &str) -> Option<&'a str> {
    lookup(root, section, field)?.as_str()
}

#[allow(clippy::cast_possible_truncation)]
fn lookup_tokens(root: &Map<String, Value>, section: &str, field: &str) -> Option<i64> {
    let value = lookup(root, section, field)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|n| n.trunc() as i64))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "organization": {"uuid": "org-1", "name": "Acme"},
        "usage": {
            "monthly_tokens": 1000000,
            "used_tokens": 250000,
            "remaining_tokens": 750000,
            "next_reset_date": "2025-07-01",
            "next_reset_unix_time": 1751328000
        },
        "rate_limit": {"requests_per_minute": 50, "requests_remaining": 49},
        "account": {"plan_type": "team", "email_address": "ops@acme.test"}
    }"#;

    #[test]
    fn test_structured_full() {
        let quota = parse_quota_structured(FULL).unwrap();
        assert_eq!(quota.organization_id, "org-1");
        assert_eq!(quota.organization_name, "Acme");
        assert_eq!(quota.monthly_quota, 1_000_000);
        assert_eq!(quota.used_quota, 250_000);
        assert_eq!(quota.remaining_quota, 750_000);
        assert!((quota.quota_percentage - 25.0).abs() < 1e-9);
        assert_eq!(quota.quota_reset_date, "2025-07-01");
        assert_eq!(quota.quota_reset_time, Some(1_751_328_000));
        assert_eq!(quota.requests_limit, 50);
        assert_eq!(quota.requests_remaining, 49);
        assert_eq!(quota.plan_type, "team");
        assert_eq!(quota.email, "ops@acme.test");
    }

    #[test]
    fn test_structured_rejects_unknown_field() {
        let body = r#"{"usage": {"monthly_tokens": 10}, "billing": {}}"#;
        assert!(parse_quota_structured(body).is_err());
    }

    #[test]
    fn test_structured_zero_monthly_leaves_percentage() {
        let quota = parse_quota_structured(r#"{"usage": {"used_tokens": 5}}"#).unwrap();
        assert_eq!(quota.quota_percentage, 0.0);
    }

    #[test]
    fn test_tolerant_derives_remaining() {
        let body = r#"{
            "organization": {"uuid": "org-9", "extra": true},
            "usage": {"monthly_tokens": 1000, "used_tokens": 400.9}
        }"#;
        let quota = parse_quota_tolerant(body).unwrap();
        assert_eq!(quota.organization_id, "org-9");
        assert_eq!(quota.used_quota, 400);
        assert_eq!(quota.remaining_quota, 600);
        assert!((quota.quota_percentage - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_tolerant_derives_over_explicit_zero() {
        let body = r#"{"usage": {"monthly_tokens": 100, "used_tokens": 40, "remaining_tokens": 0}}"#;
        assert_eq!(parse_quota_tolerant(body).unwrap().remaining_quota, 60);
    }

    #[test]
    fn test_tolerant_ignores_wrong_types() {
        let body = r#"{"organization": {"uuid": 7}, "usage": "n/a"}"#;
        let quota = parse_quota_tolerant(body).unwrap();
        assert!(quota.organization_id.is_empty());
        assert_eq!(quota.monthly_quota, 0);
        assert_eq!(quota.quota_percentage, 0.0);
    }

    #[test]
    fn test_structured_rejects_arrays() {
        assert!(parse_quota_structured("[]").is_err());
        assert!(parse_quota_structured("[{}]").is_err());

        let err = parse_quota_structured(r#"{"usage": [1000, 400]}"#).unwrap_err();
        assert!(err.to_string().contains("usage"));
    }

    #[test]
    fn test_array_section_is_not_read_positionally() {
        let quota = parse_quota_response(r#"{"usage": [1000, 400]}"#).unwrap();
        assert_eq!(quota.monthly_quota, 0);
        assert_eq!(quota.used_quota, 0);
    }

    #[test]
    fn test_tolerant_rejects_non_object() {
        assert!(parse_quota_tolerant("[1, 2, 3]").is_err());
        assert!(parse_quota_tolerant("not json").is_err());
    }

    #[test]
    fn test_response_prefers_structured() {
        // Structured keeps an explicit zero; tolerant would derive 60.
        let body = r#"{
            "usage": {"monthly_tokens": 100, "used_tokens": 40, "remaining_tokens": 0},
            "rate_limit": {"requests_per_minute": 10}
        }"#;
        let quota = parse_quota_response(body).unwrap();
        assert_eq!(quota.remaining_quota, 0);
        assert_eq!(quota.requests_limit, 10);
    }

    #[test]
    fn test_response_falls_back_to_tolerant() {
        let body = r#"{"usage": {"monthly_tokens": 100, "used_tokens": 40, "unexpected": 1}}"#;
        let quota = parse_quota_response(body).unwrap();
        assert_eq!(quota.remaining_quota, 60);
        assert!((quota.quota_percentage - 40.0).abs() < 1e-9);
    }
}
