use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RepoPayload {
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OwnerPayload {
    #[serde(default)]
    pub login: String,
}

/// One item of `GET /repos/{owner}/{repo}/forks`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ForkPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerPayload>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub stargazers_count: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub committer: Option<Signature>,
    #[serde(default)]
    pub author: Option<Signature>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BranchCommit {
    #[serde(default)]
    pub commit: CommitDetail,
}

/// `GET /repos/{owner}/{repo}/branches/{branch}`; only the tip commit matters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BranchPayload {
    #[serde(default)]
    pub commit: BranchCommit,
}

impl BranchPayload {
    pub fn tip_time(&self) -> Option<DateTime<Utc>> {
        let detail = &self.commit.commit;
        detail
            .committer
            .as_ref()
            .and_then(|s| s.date)
            .or_else(|| detail.author.as_ref().and_then(|s| s.date))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RateLimitPayload {
    pub resources: RateResources,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RateResources {
    pub core: RateBucket,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RateBucket {
    pub remaining: u32,
}
