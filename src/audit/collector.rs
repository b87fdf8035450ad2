use crate::audit::diff;
use crate::audit::types::{ComparisonResult, ForkRecord, NotableDiff, UpstreamRepository};
use crate::config::{Config, RepoSpec};
use crate::error::{AuditError, Result};
use crate::github::client::GitHubClient;
use crate::github::types::{BranchPayload, ForkPayload, RepoPayload};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;
use tracing::{debug, info, warn};

const FALLBACK_BRANCH: &str = "main";

pub struct ForkCollector<'a> {
    client: &'a GitHubClient,
    config: &'a Config,
}

impl<'a> ForkCollector<'a> {
    pub fn new(client: &'a GitHubClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// One record per fork of every configured repository, in retrieval
    /// order. Fails if any upstream or fork listing cannot be fetched.
    pub async fn collect(&self) -> Result<Vec<ForkRecord>> {
        let mut records = Vec::new();
        for spec in &self.config.repos {
            let upstream = self.fetch_upstream(spec).await?;
            let forks = self.list_forks(&upstream).await?;
            info!(
                repo = %upstream.full_name(),
                forks = forks.len(),
                "enumerated forks"
            );

            for (i, fork) in forks.iter().enumerate() {
                if i > 0 && self.config.fork_delay_ms > 0 {
                    tokio::time::sleep(self.config.fork_delay()).await;
                }
                records.push(self.inspect_fork(&upstream, fork).await?);
            }
        }
        Ok(records)
    }

    pub async fn fetch_upstream(&self, spec: &RepoSpec) -> Result<UpstreamRepository> {
        let segments = ["repos", spec.owner.as_str(), spec.name.as_str()];
        let payload: RepoPayload = decode(self.client.fetch_object(&segments, &[]).await?)?;
        Ok(UpstreamRepository {
            owner: spec.owner.clone(),
            name: spec.name.clone(),
            default_branch: non_empty_or_main(payload.default_branch),
        })
    }

    pub async fn list_forks(&self, upstream: &UpstreamRepository) -> Result<Vec<ForkPayload>> {
        let segments = ["repos", upstream.owner.as_str(), upstream.name.as_str(), "forks"];
        let query = [("per_page", self.config.page_size.to_string())];
        self.client
            .paginate_all(&segments, &query)
            .and_then(|item| async move { decode_value::<ForkPayload>(item) })
            .try_collect()
            .await
    }

    async fn inspect_fork(
        &self,
        upstream: &UpstreamRepository,
        fork: &ForkPayload,
    ) -> Result<ForkRecord> {
        let owner_login = fork
            .owner
            .as_ref()
            .map(|o| o.login.clone())
            .unwrap_or_default();
        let fork_repo = fork
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| upstream.name.clone());
        let default_branch = non_empty_or_main(fork.default_branch.clone());
        let label = format!("{owner_login}/{fork_repo}");
        debug!(fork = %label, branch = %default_branch, "inspecting fork");

        let last_push_timestamp = recover_or_default(
            &label,
            "branch lookup",
            self.latest_commit_time(&owner_login, &fork_repo, &default_branch),
        )
        .await?;

        let notable_diffs = recover_or_default(
            &label,
            "compare",
            self.notable_diffs(upstream, &owner_login, &default_branch),
        )
        .await?;

        Ok(ForkRecord {
            repo_name: upstream.full_name(),
            owner_login,
            default_branch,
            stargazer_count: fork.stargazers_count.unwrap_or(0),
            last_push_timestamp,
            notable_diffs,
        })
    }

    async fn latest_commit_time(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let segments = ["repos", owner, repo, "branches", branch];
        let branch: BranchPayload = decode(self.client.fetch_object(&segments, &[]).await?)?;
        Ok(branch.tip_time())
    }

    async fn notable_diffs(
        &self,
        upstream: &UpstreamRepository,
        fork_owner: &str,
        fork_branch: &str,
    ) -> Result<Vec<NotableDiff>> {
        let range = format!("{}...{fork_owner}:{fork_branch}", upstream.default_branch);
        let segments = [
            "repos",
            upstream.owner.as_str(),
            upstream.name.as_str(),
            "compare",
            range.as_str(),
        ];
        let comparison: ComparisonResult =
            decode(self.client.fetch_object(&segments, &[]).await?)?;
        Ok(diff::notable_diffs(
            &comparison,
            self.config.notable_threshold,
        ))
    }
}

/// Runs an optional per-fork lookup. Transport and API failures are logged
/// and replaced by `T::default()`; anything else propagates.
pub async fn recover_or_default<T, F>(fork: &str, what: &str, lookup: F) -> Result<T>
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match lookup.await {
        Ok(value) => Ok(value),
        Err(e) if e.is_recoverable() => {
            warn!(%fork, "{what} failed, continuing without it: {e}");
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

fn non_empty_or_main(branch: Option<String>) -> String {
    branch
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| FALLBACK_BRANCH.to_string())
}

fn decode<T: DeserializeOwned>(object: Map<String, Value>) -> Result<T> {
    decode_value(Value::Object(object))
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| AuditError::MalformedResponse(format!("unexpected payload shape: {e}")))
}
