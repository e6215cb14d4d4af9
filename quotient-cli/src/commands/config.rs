//! Config command - manage configuration.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use quotient_store::{Config, default_config_dir};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, config: &Config) -> Result<ExitCode> {
    match &args.action {
        ConfigAction::Show => show_config(cli, config)?,
        ConfigAction::Path => show_paths(cli, config)?,
        ConfigAction::Init { force } => init_config(cli, *force).await?,
    }
    Ok(ExitCode::Success)
}

fn show_config(cli: &Cli, config: &Config) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            println!("Quotient Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Log level:       {}", config.general.log_level);
            println!("HTTP timeout:    {}s", config.http.timeout_secs);
            println!(
                "Proxy:           {}",
                config.http.proxy_url.as_deref().unwrap_or("none")
            );
            println!();
            println!("API key base:    {}", config.anthropic.api_key.base_url);
            println!("Quota endpoints:");
            for endpoint in &config.anthropic.api_key.endpoints {
                println!("  • {endpoint}");
            }
            println!("OAuth usage URL: {}", config.anthropic.oauth.usage_url);
            println!("OAuth timeout:   {}s", config.anthropic.oauth.timeout_secs);
            println!();
            println!(
                "Token dir:       {}",
                config.storage.resolve_token_dir().display()
            );
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(config)?);
        }
    }
    Ok(())
}

fn show_paths(cli: &Cli, config: &Config) -> Result<()> {
    let config_dir = default_config_dir();
    let config_file = cli.config_path();
    let token_dir = config.storage.resolve_token_dir();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_file.display());
            println!("Token dir:   {}", token_dir.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_file.display().to_string(),
                "token_dir": token_dir.display().to_string(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&paths)?);
        }
    }
    Ok(())
}

async fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = cli.config_path();
    if !force && tokio::fs::try_exists(&path).await? {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::default().save_to(&path).await?;
    info!(path = %path.display(), "Wrote default configuration");
    if !cli.quiet {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
