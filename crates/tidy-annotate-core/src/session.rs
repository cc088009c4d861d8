//! Check-session lifecycle and batched annotation submission.
//!
//! A session moves `NotStarted -> InProgress -> Completed` and never back.
//! Every remote call is awaited before the next one is issued: later calls
//! need the id returned by `open`, and the remote run holds a single
//! annotation list that concurrent updates would race on.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::batch::{batch, BatchSize};
use crate::check_run::{Annotation, CheckRunApi, CheckRunId, CheckRunOutput, OpenCheckRun};
use crate::diagnostic::{Conclusion, Diagnostic};
use crate::error::{AnnotateError, Result};

/// Lifecycle state of a remote check session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress { id: CheckRunId },
    Completed { id: CheckRunId, conclusion: Conclusion },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not started",
            SessionState::InProgress { .. } => "in progress",
            SessionState::Completed { .. } => "completed",
        }
    }
}

/// A single remote check run, driven forward one call at a time.
pub struct CheckSession {
    api: Arc<dyn CheckRunApi>,
    title: String,
    state: SessionState,
}

impl CheckSession {
    /// A session that has not been opened yet. `title` is used as the
    /// check name and as the output title of every submission.
    pub fn new(api: Arc<dyn CheckRunApi>, title: impl Into<String>) -> Self {
        Self {
            api,
            title: title.into(),
            state: SessionState::NotStarted,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn in_progress_id(&self, action: &'static str) -> Result<CheckRunId> {
        match self.state {
            SessionState::InProgress { id } => Ok(id),
            other => Err(AnnotateError::InvalidTransition {
                state: other.name(),
                action,
            }),
        }
    }

    fn output(&self, summary: String, annotations: Vec<Annotation>) -> CheckRunOutput {
        CheckRunOutput {
            title: self.title.clone(),
            summary,
            annotations,
        }
    }

    /// Open the remote run against `head_sha`.
    pub async fn open(&mut self, head_sha: &str) -> Result<CheckRunId> {
        if self.state != SessionState::NotStarted {
            return Err(AnnotateError::InvalidTransition {
                state: self.state.name(),
                action: "open",
            });
        }

        let request = OpenCheckRun {
            name: self.title.clone(),
            head_sha: head_sha.to_string(),
            started_at: Utc::now(),
        };
        let id = self.api.open(&request).await?;
        self.state = SessionState::InProgress { id };
        crate::obs::emit_check_opened(id, &self.title, head_sha);
        Ok(id)
    }

    /// Submit interim annotations; the run stays in progress.
    pub async fn update(&mut self, summary: String, annotations: Vec<Annotation>) -> Result<()> {
        let id = self.in_progress_id("update")?;
        let output = self.output(summary, annotations);
        self.api.update(id, &output).await?;
        Ok(())
    }

    /// Submit the last annotations and complete the run.
    pub async fn close(
        &mut self,
        conclusion: Conclusion,
        summary: String,
        annotations: Vec<Annotation>,
    ) -> Result<()> {
        let id = self.in_progress_id("close")?;
        let output = self.output(summary, annotations);
        self.api.close(id, conclusion, &output, Utc::now()).await?;
        self.state = SessionState::Completed { id, conclusion };
        crate::obs::emit_check_completed(id, conclusion);
        Ok(())
    }
}

/// Publishes a full diagnostic list as one check run.
pub struct CheckSessionReporter {
    api: Arc<dyn CheckRunApi>,
    check_name: String,
    head_sha: String,
    batch_size: BatchSize,
}

impl CheckSessionReporter {
    pub fn new(
        api: Arc<dyn CheckRunApi>,
        check_name: impl Into<String>,
        head_sha: impl Into<String>,
        batch_size: BatchSize,
    ) -> Self {
        Self {
            api,
            check_name: check_name.into(),
            head_sha: head_sha.into(),
            batch_size,
        }
    }

    /// Open a run, send every batch but the last as an update, then close
    /// with the last batch and the verdict.
    ///
    /// The first remote failure aborts the whole report.
    pub async fn report(
        &self,
        diagnostics: &[Diagnostic],
        success_override: bool,
    ) -> Result<Conclusion> {
        let total = diagnostics.len();
        let conclusion = Conclusion::decide(success_override, total);
        let annotations: Vec<Annotation> = diagnostics.iter().map(Annotation::from).collect();
        let batches = batch(&annotations, self.batch_size);
        let num_batches = batches.len();

        let mut session = CheckSession::new(Arc::clone(&self.api), self.check_name.clone());
        session.open(&self.head_sha).await?;

        let (last, interim) = match batches.split_last() {
            Some((last, interim)) => (last.to_vec(), interim),
            None => (Vec::new(), &[][..]),
        };

        for (i, chunk) in interim.iter().enumerate() {
            let summary = format!(
                "Found {} clang-tidy issues, processing batch {} of {}...",
                total,
                i + 1,
                num_batches
            );
            info!("{}", summary);
            session.update(summary, chunk.to_vec()).await?;
            crate::obs::emit_batch_submitted(i + 1, num_batches, chunk.len());
        }

        let summary = format!("clang-tidy found {} issues", total);
        session.close(conclusion, summary, last).await?;
        Ok(conclusion)
    }
}
