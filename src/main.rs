mod audit;
mod config;
mod error;
mod github;
mod report;
#[cfg(test)]
mod test_utils;

use clap::Parser;
use config::{Config, RepoSpec};
use error::Result;
use github::client::GitHubClient;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "forkaudit",
    about = "Report the forks of upstream GitHub repositories as CSV",
    version
)]
struct Cli {
    #[arg(long, short, help = "Path to a config file")]
    config: Option<PathBuf>,

    #[arg(
        long = "repo",
        value_name = "OWNER/NAME",
        help = "Upstream repository to audit (repeatable, replaces the configured list)"
    )]
    repos: Vec<RepoSpec>,

    #[arg(long, short, help = "Debug logging")]
    verbose: bool,
}

// Requests are issued strictly one after another.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if !cli.repos.is_empty() {
        config.repos = cli.repos;
    }
    info!(
        repos = config.repos.len(),
        authenticated = config.token().is_some(),
        "starting fork audit"
    );

    let client = GitHubClient::new(
        &config.api_base,
        config.token(),
        &config.user_agent,
        config.request_timeout(),
    )?;

    let records = audit::run_audit(&client, &config).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report::write_report(&records, &mut out)?;
    out.flush()?;

    let remaining = client.rate_limit().await;
    info!(rows = records.len(), rate_limit_remaining = ?remaining, "fork audit complete");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
