//! Position-resolved diagnostic types.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic, in the vocabulary of the annotation sink.
///
/// Only two tiers exist: anything that should block the run is a
/// `Failure`, everything else is an informational `Notice`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Notice,
    Failure,
}

impl Level {
    /// Map a clang-tidy `Level` tag onto the sink's severity set.
    ///
    /// `Warning` and `Error` both block the run.
    pub fn from_clang(level: &str) -> Self {
        match level {
            "Warning" | "Error" => Level::Failure,
            _ => Level::Notice,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Notice => "notice",
            Level::Failure => "failure",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A byte offset together with its 1-based line and column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// 0-based byte offset into the file.
    pub offset: usize,

    /// Line number (1-indexed).
    pub line: u32,

    /// Column number (1-indexed, in bytes).
    pub column: u32,
}

/// A single issue reported by the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// Check that fired (e.g. "modernize-use-nullptr").
    pub name: String,

    /// Human-readable message.
    pub message: String,

    /// Affected file, as given by the report.
    pub file_path: String,

    /// Resolved position of the issue.
    pub location: Location,

    /// Sink severity.
    pub level: Level,
}

/// Final verdict of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
}

impl Conclusion {
    /// `Success` when explicitly overridden or when nothing was found.
    pub fn decide(success_override: bool, diagnostic_count: usize) -> Self {
        if success_override || diagnostic_count == 0 {
            Conclusion::Success
        } else {
            Conclusion::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Conclusion::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
        }
    }
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
