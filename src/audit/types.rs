use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamRepository {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
}

impl UpstreamRepository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotableDiff {
    pub filename: String,
    pub change_count: u64,
}

/// Everything the report knows about one fork. Built once by the collector
/// and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkRecord {
    pub repo_name: String,
    pub owner_login: String,
    pub default_branch: String,
    pub stargazer_count: u64,
    pub last_push_timestamp: Option<DateTime<Utc>>,
    pub notable_diffs: Vec<NotableDiff>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileChange {
    #[serde(default)]
    pub filename: String,
    #[serde(default, rename = "changes")]
    pub change_count: u64,
}

/// Body of `GET /repos/{owner}/{repo}/compare/{base}...{head}`, reduced to
/// the per-file change counts.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ComparisonResult {
    #[serde(default)]
    pub files: Vec<FileChange>,
}
