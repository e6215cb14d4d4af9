// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotient Store
//!
//! Configuration and token storage for Quotient.
//!
//! This crate provides:
//!
//! - **Config**: JSON configuration with HTTP and client settings
//! - **FileTokenStore**: Read-only access to token files
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use quotient_store::{Config, FileTokenStore, TokenStore};
//!
//! let config = Config::load_from(&Config::default_path()).await?;
//! let store = FileTokenStore::new(config.storage.resolve_token_dir());
//! for stored in store.list().await? {
//!     println!("{} ({})", stored.label(), stored.credential.kind);
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod persistence;

pub use config::{AnthropicConfig, Config, GeneralConfig, HttpConfig, LogLevel, StorageConfig};
pub use credentials::{FileTokenStore, StoredCredential, TokenRecord, TokenStore};
pub use error::StoreError;
pub use persistence::{
    TOKEN_DIR_ENV, default_config_dir, default_config_path, default_token_dir, load_json,
    save_json,
};
