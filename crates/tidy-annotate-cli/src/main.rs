//! tidy-annotate - publish clang-tidy findings to CI
//!
//! Reads the YAML written by `clang-tidy --export-fixes`, resolves every
//! finding to a line and column, and publishes the result either as
//! workflow-command log lines (`--sink log`, the default) or as a GitHub
//! check run with annotations (`--sink check`).
//!
//! Exits non-zero when issues were found, unless `--no-fail-on-issue` is set,
//! and whenever a stage of the run fails.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{debug, error, info, Level};

use tidy_annotate_core::{
    escape_data, group_by_file, AnnotateError, BatchSize, CheckRunConfig, CheckSessionReporter,
    Conclusion, Diagnostic, GithubCheckRunApi, LogFormatter, ReportParser, DEFAULT_CHECK_NAME,
};

#[derive(Parser)]
#[command(name = "tidy-annotate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish clang-tidy exported fixes as CI annotations", long_about = None)]
struct Cli {
    /// Path to the clang-tidy exported-fixes YAML file
    #[arg(long, env = "INPUT_FIXESFILE")]
    fixes_file: PathBuf,

    /// Report issues without failing the run
    #[arg(
        long,
        env = "INPUT_NOFAILONISSUE",
        action = ArgAction::SetTrue,
        value_parser = parse_input_flag
    )]
    no_fail_on_issue: bool,

    /// Where to publish diagnostics
    #[arg(long, value_enum, default_value_t = Sink::Log)]
    sink: Sink,

    /// Annotations per check-run request
    #[arg(long, default_value = "50", value_parser = parse_batch_size)]
    batch_size: BatchSize,

    /// Name of the check run
    #[arg(long, default_value = DEFAULT_CHECK_NAME)]
    check_name: String,

    /// Print log lines grouped per file, ordered by position
    #[arg(long)]
    group_by_file: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Sink {
    /// Workflow-command lines on stdout
    Log,
    /// GitHub check run with batched annotations
    Check,
}

/// Action inputs are enabled only by the exact string `true`.
fn parse_input_flag(s: &str) -> std::result::Result<bool, String> {
    Ok(s == "true")
}

fn parse_batch_size(s: &str) -> std::result::Result<BatchSize, String> {
    let n: usize = s.parse().map_err(|e| format!("invalid batch size: {e}"))?;
    BatchSize::new(n).ok_or_else(|| "batch size must be at least 1".to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tidy_annotate_core::init_tracing(cli.json, level);

    let outcome = run(&cli).await;
    let mut stdout = std::io::stdout().lock();
    match outcome {
        Ok((conclusion, issues)) => finish(&mut stdout, conclusion, issues, cli.no_fail_on_issue),
        Err(err) => {
            error!("{:#}", err);
            let _ = writeln!(stdout, "::error::{}", escape_data(&failure_message(&err)));
            ExitCode::FAILURE
        }
    }
}

/// Parse and publish; returns the verdict and the number of issues.
async fn run(cli: &Cli) -> Result<(Conclusion, usize)> {
    debug!(fixes_file = %cli.fixes_file.display(), "parsing report");
    let diagnostics = ReportParser::default()
        .parse(&cli.fixes_file)
        .await
        .context("Failed to parse clang-tidy report")?;

    let conclusion = match cli.sink {
        Sink::Log => {
            let base = std::env::current_dir().context("Failed to read working directory")?;
            let mut stdout = std::io::stdout().lock();
            publish_log(
                &mut stdout,
                &diagnostics,
                &base,
                cli.group_by_file,
                cli.no_fail_on_issue,
            )?
        }
        Sink::Check => publish_check(cli, &diagnostics).await?,
    };
    Ok((conclusion, diagnostics.len()))
}

fn publish_log<W: Write>(
    out: &mut W,
    diagnostics: &[Diagnostic],
    base: &Path,
    grouped: bool,
    no_fail_on_issue: bool,
) -> Result<Conclusion> {
    let formatter = LogFormatter::new(base);
    if grouped {
        for group in group_by_file(diagnostics).into_values() {
            formatter.emit(out, group)?;
        }
    } else {
        formatter.emit(out, diagnostics)?;
    }
    Ok(Conclusion::decide(no_fail_on_issue, diagnostics.len()))
}

async fn publish_check(cli: &Cli, diagnostics: &[Diagnostic]) -> Result<Conclusion> {
    let config = CheckRunConfig::from_env()
        .context("Failed to load check-run configuration")?
        .with_check_name(&cli.check_name)
        .with_batch_size(cli.batch_size);

    let api = GithubCheckRunApi::new(&config).context("Failed to create GitHub client")?;
    let reporter = CheckSessionReporter::new(
        Arc::new(api),
        config.check_name.clone(),
        config.head_sha.clone(),
        config.batch_size,
    );

    info!(
        repository = %format!("{}/{}", config.owner, config.repo),
        head_sha = %config.head_sha,
        "publishing check run"
    );
    let conclusion = reporter.report(diagnostics, cli.no_fail_on_issue).await?;
    Ok(conclusion)
}

/// Write the verdict and map it to an exit code.
fn finish<W: Write>(
    out: &mut W,
    conclusion: Conclusion,
    issues: usize,
    no_fail_on_issue: bool,
) -> ExitCode {
    match conclusion {
        Conclusion::Success => {
            if no_fail_on_issue {
                debug!("Not failing due to option.");
            }
            ExitCode::SUCCESS
        }
        Conclusion::Failure => {
            let _ = writeln!(out, "::error::Found {issues} clang-tidy issues");
            ExitCode::FAILURE
        }
    }
}

/// Message shown to the user for an aborted run.
fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AnnotateError>() {
        Some(annotate) if annotate.lacks_detail() => annotate.user_message(),
        _ => format!("{:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidy_annotate_core::{ApiError, Level as DiagLevel, Location};

    fn diag(file: &str, line: u32) -> Diagnostic {
        Diagnostic {
            name: "misc-unused-parameters".to_string(),
            message: "parameter 'x' is unused".to_string(),
            file_path: file.to_string(),
            location: Location {
                offset: 0,
                line,
                column: 1,
            },
            level: DiagLevel::Failure,
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["tidy-annotate", "--fixes-file", "fixes.yaml"])
            .expect("parse");
        assert_eq!(cli.fixes_file, PathBuf::from("fixes.yaml"));
        assert_eq!(cli.sink, Sink::Log);
        assert_eq!(cli.batch_size.get(), 50);
        assert_eq!(cli.check_name, DEFAULT_CHECK_NAME);
        assert!(!cli.group_by_file);
    }

    #[test]
    fn test_cli_check_sink_and_batch_size() {
        let cli = Cli::try_parse_from([
            "tidy-annotate",
            "--fixes-file",
            "f.yaml",
            "--sink",
            "check",
            "--batch-size",
            "10",
            "--no-fail-on-issue",
        ])
        .expect("parse");
        assert_eq!(cli.sink, Sink::Check);
        assert_eq!(cli.batch_size.get(), 10);
        assert!(cli.no_fail_on_issue);
    }

    #[test]
    fn test_input_flag_only_true_enables() {
        assert_eq!(parse_input_flag("true"), Ok(true));
        assert_eq!(parse_input_flag(""), Ok(false));
        assert_eq!(parse_input_flag("false"), Ok(false));
        assert_eq!(parse_input_flag("TRUE"), Ok(false));
    }

    #[test]
    fn test_cli_accepts_empty_no_fail_input() {
        std::env::set_var("INPUT_NOFAILONISSUE", "");
        let res = Cli::try_parse_from(["tidy-annotate", "--fixes-file", "f.yaml"]);
        std::env::remove_var("INPUT_NOFAILONISSUE");

        let cli = res.expect("empty action input should parse");
        assert!(!cli.no_fail_on_issue);
    }

    #[test]
    fn test_cli_rejects_zero_batch_size() {
        let res = Cli::try_parse_from([
            "tidy-annotate",
            "--fixes-file",
            "f.yaml",
            "--batch-size",
            "0",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_publish_log_fails_with_issues() {
        let diags = vec![diag("/repo/b.cpp", 4), diag("/repo/a.cpp", 2)];
        let mut out = Vec::new();
        let conclusion =
            publish_log(&mut out, &diags, Path::new("/repo"), false, false).expect("publish");
        assert_eq!(conclusion, Conclusion::Failure);

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("::error file=b.cpp,line=4,"));
        assert!(lines[1].starts_with("::error file=a.cpp,line=2,"));
    }

    #[test]
    fn test_publish_log_grouped_orders_by_file() {
        let diags = vec![diag("/repo/b.cpp", 4), diag("/repo/a.cpp", 9), diag("/repo/a.cpp", 2)];
        let mut out = Vec::new();
        publish_log(&mut out, &diags, Path::new("/repo"), true, false).expect("publish");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("::error file=a.cpp,line=2,"));
        assert!(lines[1].starts_with("::error file=a.cpp,line=9,"));
        assert!(lines[2].starts_with("::error file=b.cpp,line=4,"));
    }

    #[test]
    fn test_publish_log_override_succeeds() {
        let diags = vec![diag("a.cpp", 1)];
        let mut out = Vec::new();
        let conclusion =
            publish_log(&mut out, &diags, Path::new("/repo"), false, true).expect("publish");
        assert_eq!(conclusion, Conclusion::Success);
    }

    #[test]
    fn test_finish_writes_failure_command() {
        let mut out = Vec::new();
        let _ = finish(&mut out, Conclusion::Failure, 3, false);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "::error::Found 3 clang-tidy issues\n"
        );

        let mut out = Vec::new();
        let _ = finish(&mut out, Conclusion::Success, 3, true);
        assert!(out.is_empty());
    }

    #[test]
    fn test_failure_message_uses_fallback_for_empty_remote_error() {
        let err = anyhow::Error::new(AnnotateError::RemoteSubmission(ApiError::Http(
            String::new(),
        )));
        let msg = failure_message(&err);
        assert!(msg.contains(tidy_annotate_core::GENERIC_FAILURE_MESSAGE));
    }

    #[test]
    fn test_failure_message_keeps_context() {
        let err = anyhow::Error::new(AnnotateError::OffsetOutOfRange {
            path: "a.cpp".to_string(),
            offset: 9,
            len: 3,
        })
        .context("Failed to parse clang-tidy report");
        let msg = failure_message(&err);
        assert!(msg.contains("Failed to parse clang-tidy report"));
        assert!(msg.contains("offset 9 out of range"));
    }

    #[tokio::test]
    async fn test_run_log_sink_with_missing_report_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("fixes.yaml");
        let cli = Cli::try_parse_from([
            "tidy-annotate",
            "--fixes-file",
            missing.to_str().expect("utf8 path"),
        ])
        .expect("parse");

        let (conclusion, issues) = run(&cli).await.expect("run");
        assert_eq!(conclusion, Conclusion::Success);
        assert_eq!(issues, 0);
    }
}
