//! Error taxonomy for report parsing and annotation delivery.

use std::path::PathBuf;

use crate::check_run::ApiError;

/// Fallback description used when a failure carries no message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Error annotating files from the clang-tidy report.";

/// Errors that abort an annotation run.
///
/// A missing report is not an error: the parser recovers it as an empty
/// report before any of these are produced.
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("failed to read report {path}: {source}")]
    ReportRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed report {path}: {source}")]
    MalformedReport {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to read source file {path}: {source}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("offset {offset} out of range for {path} ({len} bytes)")]
    OffsetOutOfRange {
        path: String,
        offset: usize,
        len: usize,
    },

    #[error("{0}")]
    RemoteSubmission(#[from] ApiError),

    #[error("cannot {action} a check session that is {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("location resolver task failed: {0}")]
    ResolverTask(String),
}

impl AnnotateError {
    /// Human-readable description of the failed stage.
    ///
    /// Falls back to [`GENERIC_FAILURE_MESSAGE`] when the remote API returned
    /// an error without a message.
    pub fn user_message(&self) -> String {
        if self.lacks_detail() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    /// True for remote failures whose message is empty.
    pub fn lacks_detail(&self) -> bool {
        match self {
            AnnotateError::RemoteSubmission(api) => api.detail().trim().is_empty(),
            _ => false,
        }
    }
}

/// Result type for annotation operations.
pub type Result<T> = std::result::Result<T, AnnotateError>;
