//! Output formatting for CLI.

mod json;
mod text;

use quotient_core::{AccountKind, QuotaInfo};

pub use json::{AccountInfoOutput, JsonFormatter};
pub use text::TextFormatter;

/// Outcome of querying one account.
#[derive(Debug, Clone)]
pub struct AccountReport {
    /// Account label (token file stem, or "token").
    pub label: String,
    /// Account kind the query dispatched on.
    pub kind: AccountKind,
    /// Quota, or the error message.
    pub result: Result<QuotaInfo, String>,
}
