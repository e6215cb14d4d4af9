// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotient Core
//!
//! Core types for the Quotient quota retrieval workspace.
//!
//! This crate holds the types every other crate converges on:
//!
//! - [`QuotaInfo`] - the canonical quota record produced by every retrieval path
//! - [`Credential`] / [`AccountKind`] - the read-only view of a stored account
//! - [`CoreError`] - validation and serialization errors
//!
//! Two account kinds exist upstream. Organization/API-key accounts report an
//! absolute monthly token quota, OAuth accounts report rolling 5-hour and
//! 7-day utilization windows. Both normalize into the same [`QuotaInfo`];
//! only the field group matching the account kind is populated.

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{AccountKind, Credential, OAUTH_PLAN_TYPE, QuotaInfo, usage_percentage};
