//! In-memory fakes for the reader and check-run traits (testing only)
//!
//! Provides `MemoryContentReader` and `MemoryCheckRunApi` that satisfy the
//! trait contracts without touching the filesystem or the network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::check_run::{ApiError, CheckRunApi, CheckRunId, CheckRunOutput, OpenCheckRun};
use crate::diagnostic::Conclusion;
use crate::location::ContentReader;

// ---------------------------------------------------------------------------
// MemoryContentReader
// ---------------------------------------------------------------------------

/// Content reader backed by a `HashMap<path, content>`.
///
/// Paths that were never added read as `NotFound`.
#[derive(Debug, Default)]
pub struct MemoryContentReader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryContentReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    pub fn with_file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.insert(path.to_string(), content.as_ref().to_vec());
        self
    }
}

#[async_trait]
impl ContentReader for MemoryContentReader {
    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("{path} not found"))
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryCheckRunApi
// ---------------------------------------------------------------------------

/// One call observed by [`MemoryCheckRunApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Open(OpenCheckRun),
    Update {
        id: CheckRunId,
        output: CheckRunOutput,
    },
    Close {
        id: CheckRunId,
        conclusion: Conclusion,
        output: CheckRunOutput,
        completed_at: DateTime<Utc>,
    },
}

#[derive(Debug, Default)]
struct ApiState {
    next_id: u64,
    attempts: usize,
    calls: Vec<RecordedCall>,
}

/// Check-run backend that records every call in order.
///
/// `fail_on_call(n)` makes the n-th call (0-based, counting every kind)
/// return an error instead of recording it.
#[derive(Debug, Default)]
pub struct MemoryCheckRunApi {
    state: Mutex<ApiState>,
    fail_on: Option<(usize, String)>,
}

impl MemoryCheckRunApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call with the given index using `message`.
    pub fn fail_on_call(mut self, index: usize, message: &str) -> Self {
        self.fail_on = Some((index, message.to_string()));
        self
    }

    /// Snapshot of recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn check_failure(&self, state: &mut ApiState) -> Result<(), ApiError> {
        let attempt = state.attempts;
        state.attempts += 1;
        match &self.fail_on {
            Some((index, message)) if *index == attempt => Err(ApiError::Http(message.clone())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CheckRunApi for MemoryCheckRunApi {
    async fn open(&self, request: &OpenCheckRun) -> Result<CheckRunId, ApiError> {
        let mut state = self.state.lock().unwrap();
        self.check_failure(&mut state)?;
        state.next_id += 1;
        let id = CheckRunId(state.next_id);
        state.calls.push(RecordedCall::Open(request.clone()));
        Ok(id)
    }

    async fn update(&self, id: CheckRunId, output: &CheckRunOutput) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        self.check_failure(&mut state)?;
        state.calls.push(RecordedCall::Update {
            id,
            output: output.clone(),
        });
        Ok(())
    }

    async fn close(
        &self,
        id: CheckRunId,
        conclusion: Conclusion,
        output: &CheckRunOutput,
        completed_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        self.check_failure(&mut state)?;
        state.calls.push(RecordedCall::Close {
            id,
            conclusion,
            output: output.clone(),
            completed_at,
        });
        Ok(())
    }
}
