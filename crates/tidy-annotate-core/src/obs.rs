//! Structured lifecycle events for a report run.
//!
//! Every event carries an `event` field so log pipelines can filter on it.

use tracing::info;

use crate::check_run::CheckRunId;
use crate::diagnostic::Conclusion;

/// Emit event: report parsed into `count` diagnostics.
pub fn emit_report_parsed(report: &str, count: usize) {
    info!(event = "report.parsed", report = %report, diagnostics = count);
}

/// Emit event: remote check run opened.
pub fn emit_check_opened(id: CheckRunId, name: &str, head_sha: &str) {
    info!(event = "check.opened", check_run_id = %id, name = %name, head_sha = %head_sha);
}

/// Emit event: interim batch accepted by the remote.
pub fn emit_batch_submitted(batch: usize, total_batches: usize, annotations: usize) {
    info!(
        event = "check.batch_submitted",
        batch = batch,
        total_batches = total_batches,
        annotations = annotations,
    );
}

/// Emit event: check run completed with a conclusion.
pub fn emit_check_completed(id: CheckRunId, conclusion: Conclusion) {
    info!(event = "check.completed", check_run_id = %id, conclusion = %conclusion);
}
