//! Domain models for Quotient.
//!
//! ## Submodules
//!
//! - [`quota`] - The canonical quota record ([`QuotaInfo`])
//! - [`credential`] - Stored account credentials ([`Credential`], [`AccountKind`])

mod credential;
mod quota;

pub use credential::{AccountKind, Credential};
pub use quota::{OAUTH_PLAN_TYPE, QuotaInfo, usage_percentage};
