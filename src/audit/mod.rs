pub mod collector;
pub mod diff;
pub mod rank;
pub mod types;

use crate::config::Config;
use crate::error::Result;
use crate::github::client::GitHubClient;
use collector::ForkCollector;
use types::ForkRecord;

/// Collects every fork of the configured repositories and returns them in
/// report order.
pub async fn run_audit(client: &GitHubClient, config: &Config) -> Result<Vec<ForkRecord>> {
    let records = ForkCollector::new(client, config).collect().await?;
    Ok(rank::rank(records))
}
