//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Duration, Local, Utc};
use quotient_core::{AccountKind, QuotaInfo};
use quotient_store::StoredCredential;

use super::AccountReport;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats the outcome for one account.
    pub fn format_report(&self, report: &AccountReport) -> String {
        let label = if report.label.is_empty() {
            "account"
        } else {
            report.label.as_str()
        };
        match &report.result {
            Ok(quota) => self.format_quota(label, report.kind, quota),
            Err(e) => self.format_error(label, e),
        }
    }

    /// Formats quota for an account.
    pub fn format_quota(&self, label: &str, kind: AccountKind, quota: &QuotaInfo) -> String {
        let mut lines = vec![format!("{} ({})", self.bold(label), kind)];

        if quota.is_rolling_window() {
            lines.push(self.format_window(
                "5h",
                quota.five_hour_utilization,
                &quota.five_hour_resets_at,
            ));
            lines.push(self.format_window(
                "7d",
                quota.seven_day_utilization,
                &quota.seven_day_resets_at,
            ));
            lines.push(self.format_window(
                "Sonnet",
                quota.seven_day_sonnet_utilization,
                &quota.seven_day_sonnet_resets_at,
            ));
        } else {
            lines.push(self.format_window("Tokens", quota.quota_percentage, ""));
            lines.push(format!(
                "         {} of {} used, {} left",
                self.format_number(quota.used_quota),
                self.format_number(quota.monthly_quota),
                self.format_number(quota.remaining_quota)
            ));
            if let Some(reset) = quota.reset_at() {
                lines.push(format!(
                    "         Resets {}",
                    self.dim(&self.format_reset_time(reset))
                ));
            } else if !quota.quota_reset_date.is_empty() {
                lines.push(format!("         Resets {}", self.dim(&quota.quota_reset_date)));
            }
            if quota.requests_limit > 0 {
                lines.push(format!(
                    "Requests: {}/{} per minute",
                    quota.requests_remaining, quota.requests_limit
                ));
            }
        }

        if !quota.email.is_empty() {
            lines.push(format!("Account: {}", self.cyan(&quota.email)));
        }
        if !quota.organization_name.is_empty() {
            lines.push(format!("Org:     {}", quota.organization_name));
        }
        if !quota.plan_type.is_empty() && !quota.is_rolling_window() {
            lines.push(format!("Plan:    {}", self.blue(&quota.plan_type)));
        }

        lines.join("\n")
    }

    /// Formats a usage window with progress bar.
    fn format_window(&self, label: &str, used_percent: f64, resets_at: &str) -> String {
        let remaining = 100.0 - used_percent;
        let bar = self.progress_bar(remaining);
        let pct_str = self.color_for_percent(remaining, &format!("{remaining:.0}% left"));

        let mut result = format!("{:<8} {} {}", format!("{label}:"), bar, pct_str);

        if let Ok(reset) = DateTime::parse_from_rfc3339(resets_at) {
            let reset_str = self.format_reset_time(reset.with_timezone(&Utc));
            result.push_str(&format!("\n         Resets {}", self.dim(&reset_str)));
        } else if !resets_at.is_empty() {
            result.push_str(&format!("\n         Resets {}", self.dim(resets_at)));
        }

        result
    }

    /// Formats a progress bar.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn progress_bar(&self, percent_remaining: f64) -> String {
        let clamped = percent_remaining.clamp(0.0, 100.0);
        let filled = ((clamped / 100.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(percent_remaining, &bar)
    }

    /// Formats reset time as countdown or absolute.
    fn format_reset_time(&self, resets_at: DateTime<Utc>) -> String {
        let now = Utc::now();
        let local_reset = resets_at.with_timezone(&Local);

        if resets_at <= now {
            return "now".to_string();
        }

        let diff = resets_at - now;

        if diff < Duration::hours(24) {
            if diff < Duration::hours(1) {
                let mins = diff.num_minutes();
                format!("in {} minute{}", mins, if mins == 1 { "" } else { "s" })
            } else {
                let hours = diff.num_hours();
                let mins = diff.num_minutes() % 60;
                if mins > 0 {
                    format!("in {hours}h {mins}m")
                } else {
                    format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
                }
            }
        } else {
            let today = Local::now().date_naive();
            let reset_date = local_reset.date_naive();

            if reset_date == today + chrono::Days::new(1) {
                format!("tomorrow at {}", local_reset.format("%l:%M %p").to_string().trim())
            } else {
                local_reset.format("%a %b %e at %l:%M %p").to_string()
            }
        }
    }

    /// Formats the account list header.
    pub fn format_accounts_header(&self) -> String {
        format!(
            "{:<20} {:<8} {:<28} {}",
            self.bold("Account"),
            self.bold("Kind"),
            self.bold("Email"),
            self.bold("Token")
        )
    }

    /// Formats one stored account. Never prints the token itself.
    pub fn format_account_line(&self, stored: &StoredCredential, now: DateTime<Utc>) -> String {
        let email = stored.credential.cached_email().unwrap_or("−");
        let status = match stored.expires_at {
            Some(_) if stored.is_expired_at(now) => self.red("expired"),
            Some(t) => self.green(&format!("valid until {}", t.format("%Y-%m-%d %H:%M UTC"))),
            None => self.dim("no expiry recorded"),
        };

        format!(
            "{:<20} {:<8} {:<28} {}",
            stored.label(),
            stored.credential.kind.to_string(),
            email,
            status
        )
    }

    /// Formats an error message.
    pub fn format_error(&self, label: &str, error: &str) -> String {
        format!("{}: {} - {}", self.bold(label), self.red("Error"), error)
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_number(&self, n: i64) -> String {
        let value = n as f64;
        if value.abs() >= 1_000_000.0 {
            format!("{:.1}M", value / 1_000_000.0)
        } else if value.abs() >= 1_000.0 {
            format!("{:.1}K", value / 1_000.0)
        } else {
            n.to_string()
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}
