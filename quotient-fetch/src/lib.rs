// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotient Fetch
//!
//! HTTP plumbing for the Quotient quota clients.
//!
//! - [`context::FetchContext`] - Per-call cancellation token and deadline
//! - [`http::HttpClient`] - reqwest wrapper whose requests honor a context
//! - [`probe`] - Sequential, first-success probing over an ordered endpoint list
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use quotient_fetch::{FetchContext, HttpClient};
//!
//! let client = HttpClient::new()?;
//! let ctx = FetchContext::builder().timeout(Duration::from_secs(10)).build();
//! let response = client.get_with_headers(&ctx, "https://example.com", Default::default()).await?;
//! ```

pub mod context;
pub mod error;
pub mod http;
pub mod probe;

pub use context::{FetchContext, FetchContextBuilder};
pub use error::HttpError;
pub use http::{HttpClient, HttpResponse, HttpSettings, build_headers};
pub use probe::{ProbeAttempt, ProbeFailure, ProbeOutcome, ProbeSuccess, probe_in_order, probe_in_order_with};
