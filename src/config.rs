use crate::error::{AuditError, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    pub owner: String,
    pub name: String,
}

impl RepoSpec {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepoSpec::new(owner, name))
            }
            _ => Err(format!("expected OWNER/NAME, got {s:?}")),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base: String,
    pub github_token: Option<String>,
    pub user_agent: String,
    #[serde(default = "default_repos")]
    pub repos: Vec<RepoSpec>,
    pub notable_threshold: u64,
    pub page_size: u32,
    pub fork_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("user_agent", &self.user_agent)
            .field("repos", &self.repos)
            .field("notable_threshold", &self.notable_threshold)
            .field("page_size", &self.page_size)
            .field("fork_delay_ms", &self.fork_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_repos() -> Vec<RepoSpec> {
    vec![
        RepoSpec::new("Systems-Modeling", "SysML-v2-API-Services"),
        RepoSpec::new("Systems-Modeling", "SysML-v2-Pilot-Implementation"),
        RepoSpec::new("Systems-Modeling", "SysML-v2-Release"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            github_token: None,
            user_agent: "sysml-fork-audit".to_string(),
            repos: default_repos(),
            notable_threshold: 200,
            page_size: 100,
            fork_delay_ms: 100,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Layers defaults, the config file, `FORKAUDIT_*` variables and
    /// `GITHUB_TOKEN`, in that order.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config_dir().join("forkaudit").join("config.toml"));

        if config_path.is_some() && !config_file.exists() {
            return Err(AuditError::Config(format!(
                "config file not found: {}",
                config_file.display()
            )));
        }

        let config: Config = figment(&config_file)
            .extract()
            .map_err(|e| AuditError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn token(&self) -> Option<&str> {
        self.github_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn fork_delay(&self) -> Duration {
        Duration::from_millis(self.fork_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.repos.is_empty() {
            return Err(AuditError::Config("no repositories configured".to_string()));
        }
        if self.page_size == 0 || self.page_size > 100 {
            return Err(AuditError::Config(format!(
                "page_size must be within 1..=100, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

fn figment(config_file: &Path) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if config_file.exists() {
        figment = figment.merge(Toml::file(config_file));
    }

    figment.merge(Env::prefixed("FORKAUDIT_")).merge(
        Env::raw()
            .only(&["GITHUB_TOKEN"])
            .map(|_| "github_token".into()),
    )
}

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}
