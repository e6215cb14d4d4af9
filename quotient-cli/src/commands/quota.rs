//! Quota command - fetch and display quota for one or more accounts.

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use futures::future::join_all;
use quotient_core::{AccountKind, Credential};
use quotient_fetch::FetchContext;
use quotient_providers::QuotaFetcher;
use quotient_store::{Config, FileTokenStore, TokenStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::output::{AccountReport, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the quota command.
#[derive(Args, Default)]
pub struct QuotaArgs {
    /// Access token to query directly.
    #[arg(long)]
    pub token: Option<String>,

    /// Account kind for --token (inferred from the token prefix if omitted).
    #[arg(long, requires = "token")]
    pub kind: Option<KindArg>,

    /// Email to report for --token when upstream omits one.
    #[arg(long, requires = "token")]
    pub email: Option<String>,

    /// Query a single token file.
    #[arg(long, conflicts_with = "token")]
    pub file: Option<PathBuf>,

    /// Query every token file in this directory.
    #[arg(long, conflicts_with_all = ["token", "file"])]
    pub dir: Option<PathBuf>,

    /// Overall deadline in seconds for all requests.
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Account kind as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Console API key or organization account.
    ApiKey,
    /// OAuth account.
    Oauth,
}

impl From<KindArg> for AccountKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::ApiKey => AccountKind::ApiKey,
            KindArg::Oauth => AccountKind::OAuth,
        }
    }
}

/// Runs the quota command.
pub async fn run(args: &QuotaArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    let credentials = collect_credentials(args, config).await?;
    info!(accounts = credentials.len(), "Fetching quota");

    let fetcher = QuotaFetcher::from_settings(
        &config.http.to_settings(),
        config.anthropic.api_key.clone(),
        config.anthropic.oauth.clone(),
    )?;

    let mut builder = FetchContext::builder();
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let ctx = builder.build();

    let interrupt = {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupted, cancelling outstanding requests");
                ctx.cancel();
            }
        })
    };

    let reports = fetch_all(&fetcher, &ctx, &credentials).await;
    interrupt.abort();

    output_reports(&reports, cli)?;

    if reports.iter().all(|r| r.result.is_err()) {
        return Ok(ExitCode::AllFailed);
    }
    Ok(ExitCode::Success)
}

/// Resolves the credentials to query from the arguments and config.
async fn collect_credentials(args: &QuotaArgs, config: &Config) -> Result<Vec<Credential>> {
    if let Some(token) = &args.token {
        let mut credential = match args.kind {
            Some(kind) => Credential::new(token.as_str(), kind.into()),
            None => Credential::from_token(token.as_str()),
        }
        .with_label("token");
        if let Some(email) = &args.email {
            credential = credential.with_email(email.as_str());
        }
        return Ok(vec![credential]);
    }

    if let Some(path) = &args.file {
        let stored = FileTokenStore::load(path).await?;
        return Ok(vec![stored.credential]);
    }

    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.storage.resolve_token_dir());
    let stored = FileTokenStore::new(&dir).list().await?;
    if stored.is_empty() {
        bail!("No Anthropic credentials found in {}", dir.display());
    }
    Ok(stored.into_iter().map(|s| s.credential).collect())
}

/// Fetches quota for every credential concurrently.
///
/// Each credential gets its own child context so one slow account cannot
/// cancel the others, while cancelling `ctx` still stops them all.
async fn fetch_all(
    fetcher: &QuotaFetcher,
    ctx: &FetchContext,
    credentials: &[Credential],
) -> Vec<AccountReport> {
    let tasks = credentials.iter().map(|credential| {
        let child = ctx.child();
        async move {
            let result = fetcher
                .fetch(&child, Some(credential))
                .await
                .map_err(|e| e.to_string());
            AccountReport {
                label: credential.label.clone().unwrap_or_default(),
                kind: credential.kind,
                result,
            }
        }
    });
    join_all(tasks).await
}

/// Outputs reports in the appropriate format.
fn output_reports(reports: &[AccountReport], cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            let blocks: Vec<String> = reports.iter().map(|r| formatter.format_report(r)).collect();
            println!("{}", blocks.join("\n\n"));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_reports(reports)?);
        }
    }
    Ok(())
}
