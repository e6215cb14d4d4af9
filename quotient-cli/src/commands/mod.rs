//! CLI command implementations.

pub mod accounts;
pub mod config;
pub mod quota;
