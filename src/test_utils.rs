#![cfg(test)]

use crate::audit::types::{ForkRecord, NotableDiff};
use crate::config::{Config, RepoSpec};
use crate::github::client::GitHubClient;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap()
}

/// Request path as the client encodes it, one percent-encoded segment each.
pub fn encoded_path(segments: &[&str]) -> String {
    let mut url = Url::parse("http://localhost").unwrap();
    url.path_segments_mut().unwrap().pop_if_empty().extend(segments);
    url.path().to_string()
}

pub fn make_client(base: &str, token: Option<&str>) -> GitHubClient {
    GitHubClient::new(base, token, "test-agent", Duration::from_secs(5)).unwrap()
}

pub fn make_config(repos: &[&str]) -> Config {
    Config {
        repos: repos.iter().map(|r| r.parse::<RepoSpec>().unwrap()).collect(),
        fork_delay_ms: 0,
        ..Config::default()
    }
}

pub fn make_record(owner: &str, pushed: Option<&str>, stars: u64) -> ForkRecord {
    ForkRecord {
        repo_name: "Org/Repo".to_string(),
        owner_login: owner.to_string(),
        default_branch: "main".to_string(),
        stargazer_count: stars,
        last_push_timestamp: pushed.map(ts),
        notable_diffs: Vec::new(),
    }
}

pub fn make_diff(filename: &str, change_count: u64) -> NotableDiff {
    NotableDiff {
        filename: filename.to_string(),
        change_count,
    }
}

pub fn fork_item(owner: &str, name: &str, branch: Option<&str>, stars: u64) -> Value {
    json!({
        "name": name,
        "owner": { "login": owner },
        "default_branch": branch,
        "stargazers_count": stars,
    })
}

pub async fn mount_upstream(server: &MockServer, owner: &str, name: &str, branch: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{owner}/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": name,
            "owner": { "login": owner },
            "default_branch": branch,
        })))
        .mount(server)
        .await;
}

/// Serves `pages` as a Link-paginated fork listing; each page is requested
/// exactly once.
pub async fn mount_fork_pages(server: &MockServer, owner: &str, name: &str, pages: Vec<Vec<Value>>) {
    let listing = format!("/repos/{owner}/{name}/forks");
    let count = pages.len();

    for (i, items) in pages.into_iter().enumerate() {
        let mut response = ResponseTemplate::new(200).set_body_json(Value::Array(items));
        if i + 1 < count {
            let next = format!("{}{listing}?per_page=100&page={}", server.uri(), i + 2);
            response = response.insert_header("link", format!("<{next}>; rel=\"next\"").as_str());
        }

        let mock = Mock::given(method("GET")).and(path(listing.as_str()));
        let mock = if i == 0 {
            mock.and(query_param_is_missing("page"))
        } else {
            mock.and(query_param("page", (i + 1).to_string()))
        };
        mock.respond_with(response).expect(1).mount(server).await;
    }
}

pub async fn mount_branch(server: &MockServer, owner: &str, name: &str, branch: &str, date: &str) {
    Mock::given(method("GET"))
        .and(path(encoded_path(&["repos", owner, name, "branches", branch])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": branch,
            "commit": { "commit": {
                "author": { "date": date },
                "committer": { "date": date },
            }},
        })))
        .mount(server)
        .await;
}

pub async fn mount_compare(
    server: &MockServer,
    owner: &str,
    name: &str,
    base: &str,
    fork_owner: &str,
    fork_branch: &str,
    files: Vec<(&str, u64)>,
) {
    let files: Vec<Value> = files
        .into_iter()
        .map(|(filename, changes)| json!({ "filename": filename, "changes": changes }))
        .collect();
    Mock::given(method("GET"))
        .and(path(encoded_path(&[
            "repos",
            owner,
            name,
            "compare",
            &format!("{base}...{fork_owner}:{fork_branch}"),
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "diverged",
            "files": files,
        })))
        .mount(server)
        .await;
}

/// Org/Repo with two forks: alice (older, 5 stars, one 250-line file) and
/// bob (newer, 1 star, nothing over threshold).
pub async fn mount_scenario(server: &MockServer) {
    mount_upstream(server, "Org", "Repo", "main").await;
    mount_fork_pages(
        server,
        "Org",
        "Repo",
        vec![vec![
            fork_item("alice", "Repo", Some("main"), 5),
            fork_item("bob", "Repo", Some("main"), 1),
        ]],
    )
    .await;
    mount_branch(server, "alice", "Repo", "main", "2024-01-02T00:00:00Z").await;
    mount_branch(server, "bob", "Repo", "main", "2024-06-01T00:00:00Z").await;
    mount_compare(server, "Org", "Repo", "main", "alice", "main", vec![("src/big.rs", 250), ("README.md", 3)]).await;
    mount_compare(server, "Org", "Repo", "main", "bob", "main", vec![("src/lib.rs", 10)]).await;
}
