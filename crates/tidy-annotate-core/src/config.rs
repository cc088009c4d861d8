//! Check-run configuration loaded from the CI environment.

use serde_json::Value;

use crate::batch::BatchSize;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Name of the check run created for a report.
pub const DEFAULT_CHECK_NAME: &str = "ClangTidy report";

/// Errors produced while assembling a [`CheckRunConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid repository '{0}', expected owner/repo")]
    InvalidRepository(String),

    #[error("failed to read event payload {path}: {detail}")]
    EventPayload { path: String, detail: String },
}

/// Everything needed to open and fill one check run.
#[derive(Debug, Clone)]
pub struct CheckRunConfig {
    pub api_url: String,
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// Commit the run is attached to.
    pub head_sha: String,
    pub check_name: String,
    pub batch_size: BatchSize,
}

impl CheckRunConfig {
    /// Load from the process environment.
    ///
    /// Reads `GITHUB_API_URL`, `GITHUB_TOKEN` (or the `repo-token` action
    /// input), `GITHUB_REPOSITORY`, and the head commit: the pull request head
    /// from `GITHUB_EVENT_PATH` when the event is a pull request, otherwise
    /// `GITHUB_SHA`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token = non_empty("INPUT_REPO-TOKEN")
            .or_else(|| non_empty("GITHUB_TOKEN"))
            .ok_or(ConfigError::Missing("GITHUB_TOKEN"))?;

        let repository =
            non_empty("GITHUB_REPOSITORY").ok_or(ConfigError::Missing("GITHUB_REPOSITORY"))?;
        let (owner, repo) = split_repository(&repository)?;

        let pr_head = match non_empty("GITHUB_EVENT_PATH") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::EventPayload {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
                let payload: Value =
                    serde_json::from_str(&raw).map_err(|e| ConfigError::EventPayload {
                        path: path.clone(),
                        detail: e.to_string(),
                    })?;
                pull_request_head_sha(&payload)
            }
            None => None,
        };
        let head_sha = pr_head
            .or_else(|| non_empty("GITHUB_SHA"))
            .ok_or(ConfigError::Missing("GITHUB_SHA"))?;

        Ok(Self {
            api_url,
            token,
            owner,
            repo,
            head_sha,
            check_name: DEFAULT_CHECK_NAME.to_string(),
            batch_size: BatchSize::default(),
        })
    }

    pub fn with_check_name(mut self, name: &str) -> Self {
        self.check_name = name.to_string();
        self
    }

    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

fn split_repository(repository: &str) -> Result<(String, String), ConfigError> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ConfigError::InvalidRepository(repository.to_string())),
    }
}

/// Head commit of the pull request in a workflow event payload, if any.
pub fn pull_request_head_sha(payload: &Value) -> Option<String> {
    payload["pull_request"]["head"]["sha"]
        .as_str()
        .map(str::to_string)
}
