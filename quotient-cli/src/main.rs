// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Quotient CLI - Anthropic quota retrieval from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Quota for every stored account
//! quotient
//!
//! # A single token
//! quotient quota --token sk-ant-api03-... --kind api-key
//!
//! # One token file, JSON output
//! quotient quota --file ~/.config/quotient/tokens/work.json --format json --pretty
//!
//! # List stored accounts
//! quotient accounts
//!
//! # Write a default config file
//! quotient config init
//! ```

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use quotient_store::{Config, LogLevel};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{accounts, config, quota};

// ============================================================================
// CLI Definition
// ============================================================================

/// Quotient CLI - Anthropic quota retrieval.
#[derive(Parser)]
#[command(name = "quotient")]
#[command(about = "Anthropic quota and usage retrieval")]
#[command(long_about = r#"
Quotient reports quota for Anthropic accounts.

Account kinds:
  • API key / organization - monthly token quota from the Console API
  • OAuth - rolling 5-hour and 7-day utilization

Examples:
  quotient                          # Every account in the token directory
  quotient quota --token <TOKEN>    # A single token (kind inferred)
  quotient accounts                 # List stored accounts
  quotient --format json            # JSON output
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'quota' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Configuration file to use instead of the default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch quota (default if no command specified).
    #[command(visible_alias = "q")]
    Quota(quota::QuotaArgs),

    /// List stored accounts.
    #[command(visible_alias = "a")]
    Accounts(accounts::AccountsArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Every queried account failed.
    AllFailed = 2,
}

impl Cli {
    /// Path of the config file in effect.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Loads the config file in effect.
    pub async fn load_config(&self) -> Result<Config> {
        let path = self.config_path();
        Config::load_from(&path)
            .await
            .with_context(|| format!("failed to load config from {}", path.display()))
    }

    fn is_config_init(&self) -> bool {
        matches!(
            &self.command,
            Some(Commands::Config(config::ConfigArgs {
                action: config::ConfigAction::Init { .. }
            }))
        )
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return;
    }

    let default_directive = if verbose {
        "quotient=debug,info".to_string()
    } else {
        format!("quotient={level}")
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config().await {
        Ok(config) => Ok(config),
        // A broken file must not block writing a fresh one.
        Err(_) if cli.is_config_init() => Ok(Config::default()),
        Err(e) => Err(e),
    };

    let code = match config {
        Ok(config) => {
            setup_logging(cli.verbose, cli.quiet, config.general.log_level);
            run(&cli, &config).await
        }
        Err(e) => Err(e),
    };

    let code = code.unwrap_or_else(|e| {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        ExitCode::Error
    });

    std::process::exit(code as i32);
}

async fn run(cli: &Cli, config: &Config) -> Result<ExitCode> {
    match &cli.command {
        Some(Commands::Quota(args)) => quota::run(args, cli, config).await,
        Some(Commands::Accounts(args)) => accounts::run(args, cli, config).await,
        Some(Commands::Config(args)) => config::run(args, cli, config).await,
        None => quota::run(&quota::QuotaArgs::default(), cli, config).await,
    }
}
