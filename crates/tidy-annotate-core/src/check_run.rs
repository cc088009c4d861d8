//! Check-run API contract.
//!
//! The remote check session is reached through [`CheckRunApi`]. The GitHub
//! REST implementation lives in [`crate::github`]; an in-memory fake for
//! tests lives in [`crate::fakes`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostic::{Conclusion, Diagnostic, Level};

/// Identifier of a remote check run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CheckRunId(pub u64);

impl std::fmt::Display for CheckRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors returned by a check-run backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Http(String),

    #[error("check-runs API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected check-runs API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The message reported by the transport or by the API itself.
    pub fn detail(&self) -> &str {
        match self {
            ApiError::Http(message) | ApiError::Decode(message) => message,
            ApiError::Status { message, .. } => message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}

/// A single-point annotation attached to a check run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Annotation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub annotation_level: Level,
    pub title: String,
    pub message: String,
}

impl From<&Diagnostic> for Annotation {
    fn from(diag: &Diagnostic) -> Self {
        Self {
            path: diag.file_path.clone(),
            start_line: diag.location.line,
            end_line: diag.location.line,
            start_column: diag.location.column,
            end_column: diag.location.column + 1,
            annotation_level: diag.level,
            title: diag.level.to_string(),
            message: diag.message.clone(),
        }
    }
}

/// Output block sent with every update and with the final close.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    pub annotations: Vec<Annotation>,
}

/// Parameters for opening a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCheckRun {
    pub name: String,
    pub head_sha: String,
    pub started_at: DateTime<Utc>,
}

/// Remote check-session backend.
///
/// Implementations must not be called concurrently for the same run; the
/// reporter awaits each call before issuing the next.
#[async_trait]
pub trait CheckRunApi: Send + Sync {
    /// Create a run in the `in_progress` state.
    async fn open(&self, request: &OpenCheckRun) -> Result<CheckRunId, ApiError>;

    /// Append annotations while keeping the run `in_progress`.
    async fn update(&self, id: CheckRunId, output: &CheckRunOutput) -> Result<(), ApiError>;

    /// Mark the run `completed` with a conclusion and the last annotations.
    async fn close(
        &self,
        id: CheckRunId,
        conclusion: Conclusion,
        output: &CheckRunOutput,
        completed_at: DateTime<Utc>,
    ) -> Result<(), ApiError>;
}
