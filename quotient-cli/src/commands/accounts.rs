//! Accounts command - list stored credentials.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use quotient_store::{Config, FileTokenStore, TokenStore};
use std::path::PathBuf;

use crate::output::{AccountInfoOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the accounts command.
#[derive(Args, Default)]
pub struct AccountsArgs {
    /// Token directory (defaults to the configured one).
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Runs the accounts command.
pub async fn run(args: &AccountsArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.storage.resolve_token_dir());
    let stored = FileTokenStore::new(&dir).list().await?;
    let now = Utc::now();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            if stored.is_empty() {
                println!("No Anthropic credentials in {}", dir.display());
            } else {
                println!("{}", formatter.format_accounts_header());
                for account in &stored {
                    println!("{}", formatter.format_account_line(account, now));
                }
            }
        }
        OutputFormat::Json => {
            let outputs: Vec<AccountInfoOutput> = stored
                .iter()
                .map(|s| AccountInfoOutput::from_stored(s, now))
                .collect();
            println!("{}", JsonFormatter::new(cli.pretty).format(&outputs)?);
        }
    }

    Ok(ExitCode::Success)
}
