//! pkgsync CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load `config.toml` (see [`config`]) and apply
//!    command-line and environment overrides.
//! 2. **Wire observability**: install a `tracing-subscriber` fmt layer (JSON
//!    or pretty) and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an
//!    OpenTelemetry OTLP exporter. Every span and event emitted by the
//!    workspace crates flows through it.
//! 3. **Construct infrastructure**: `Git2Backend`, the configured forge
//!    services, and the HTTP reachability probe, injected into
//!    `identity::LocalProject`.
//! 4. **Run the command** and print its JSON result on stdout.

mod config;
mod observability;
mod resolve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use forge::ForgeKind;

use crate::config::Config;
use crate::observability::LogFormat;
use crate::resolve::ResolveArgs;

#[derive(Debug, Parser)]
#[command(name = "pkgsync", version, about = "Resolve and synchronise package repository identities")]
struct Cli {
    /// Configuration file (default: `<config dir>/pkgsync/config.toml`).
    #[arg(long, global = true, env = "PKGSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (logs go to stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Token for GitHub forges without one in the configuration file.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Token for GitLab forges without one in the configuration file.
    #[arg(long, global = true, env = "GITLAB_TOKEN", hide_env_values = true)]
    gitlab_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Derive a project's identity from whatever is known about it.
    Resolve(ResolveArgs),
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(token) = &self.github_token {
            config.fill_token(ForgeKind::Github, token);
        }
        if let Some(token) = &self.gitlab_token {
            config.fill_token(ForgeKind::Gitlab, token);
        }
        Ok(config)
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    match cli.command {
        Command::Resolve(args) => resolve::run(args, config).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let telemetry = match observability::init(cli.log_format) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    let result = run(cli).await;
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "pkgsync failed");
    }
    telemetry.shutdown();

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        // Exit without waiting on a resolution thread that overran its limit.
        std::process::exit(1);
    }
}
