//! tidy-annotate core library
//!
//! Turns a clang-tidy exported-fixes report into position-resolved
//! diagnostics and publishes them:
//! - as workflow-command log lines ([`output`]), or
//! - as a GitHub check run with batched annotations ([`session`]).

pub mod batch;
pub mod check_run;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod fakes;
pub mod github;
pub mod location;
pub mod obs;
pub mod output;
pub mod report;
pub mod session;
pub mod telemetry;

pub use batch::{batch, BatchSize, DEFAULT_BATCH_SIZE};
pub use check_run::{
    Annotation, ApiError, CheckRunApi, CheckRunId, CheckRunOutput, OpenCheckRun,
};
pub use config::{CheckRunConfig, ConfigError, DEFAULT_CHECK_NAME};
pub use diagnostic::{Conclusion, Diagnostic, Level, Location};
pub use error::{AnnotateError, Result, GENERIC_FAILURE_MESSAGE};
pub use github::GithubCheckRunApi;
pub use location::{locate, ContentReader, FsContentReader, LocationResolver};
pub use output::{display_path, escape_data, escape_property, format_line, LogFormatter};
pub use report::{group_by_file, ReportParser};
pub use session::{CheckSession, CheckSessionReporter, SessionState};
pub use telemetry::init_tracing;

/// tidy-annotate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
