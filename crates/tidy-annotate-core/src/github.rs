//! GitHub check-runs REST client.
//!
//! See <https://docs.github.com/en/rest/checks/runs>.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::check_run::{ApiError, CheckRunApi, CheckRunId, CheckRunOutput, OpenCheckRun};
use crate::config::CheckRunConfig;
use crate::diagnostic::Conclusion;

const USER_AGENT: &str = concat!("tidy-annotate/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct CreatedCheckRun {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct GithubErrorBody {
    #[serde(default)]
    message: String,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Check-run backend talking to the GitHub REST API.
pub struct GithubCheckRunApi {
    api_url: String,
    owner: String,
    repo: String,
    token: String,
    http_client: reqwest::Client,
}

impl GithubCheckRunApi {
    pub fn new(config: &CheckRunConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token: config.token.clone(),
            http_client,
        })
    }

    fn runs_url(&self) -> String {
        format!("{}/repos/{}/{}/check-runs", self.api_url, self.owner, self.repo)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GithubErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn patch(&self, id: CheckRunId, body: &Value) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.runs_url(), id);
        debug!(check_run_id = %id, "patching check run");
        self.send(self.http_client.patch(&url).json(body)).await?;
        Ok(())
    }
}

#[async_trait]
impl CheckRunApi for GithubCheckRunApi {
    async fn open(&self, request: &OpenCheckRun) -> Result<CheckRunId, ApiError> {
        let body = json!({
            "name": request.name,
            "head_sha": request.head_sha,
            "status": "in_progress",
            "started_at": timestamp(request.started_at),
        });
        let response = self
            .send(self.http_client.post(self.runs_url()).json(&body))
            .await?;
        let created: CreatedCheckRun = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(CheckRunId(created.id))
    }

    async fn update(&self, id: CheckRunId, output: &CheckRunOutput) -> Result<(), ApiError> {
        let body = json!({
            "status": "in_progress",
            "output": output,
        });
        self.patch(id, &body).await
    }

    async fn close(
        &self,
        id: CheckRunId,
        conclusion: Conclusion,
        output: &CheckRunOutput,
        completed_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let body = json!({
            "status": "completed",
            "conclusion": conclusion,
            "completed_at": timestamp(completed_at),
            "output": output,
        });
        self.patch(id, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> CheckRunConfig {
        CheckRunConfig {
            api_url: "https://api.github.com/".to_string(),
            token: "t0ken".to_string(),
            owner: "octo".to_string(),
            repo: "widgets".to_string(),
            head_sha: "abc".to_string(),
            check_name: "ClangTidy report".to_string(),
            batch_size: Default::default(),
        }
    }

    #[test]
    fn test_runs_url_trims_trailing_slash() {
        let api = GithubCheckRunApi::new(&config()).expect("client");
        assert_eq!(
            api.runs_url(),
            "https://api.github.com/repos/octo/widgets/check-runs"
        );
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(timestamp(at), "2024-03-01T12:30:05Z");
    }

    #[test]
    fn test_error_body_message_extraction() {
        let body: GithubErrorBody =
            serde_json::from_str(r#"{"message":"Bad credentials","documentation_url":"x"}"#)
                .expect("parse");
        assert_eq!(body.message, "Bad credentials");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let mut cfg = config();
        cfg.api_url = "http://127.0.0.1:9".to_string();
        let api = GithubCheckRunApi::new(&cfg).expect("client");
        let request = OpenCheckRun {
            name: "c".to_string(),
            head_sha: "abc".to_string(),
            started_at: Utc::now(),
        };
        let err = api.open(&request).await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
    }
}
