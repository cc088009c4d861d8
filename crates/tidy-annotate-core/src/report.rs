//! clang-tidy exported-fixes report parsing.
//!
//! The report is the YAML document written by `clang-tidy
//! --export-fixes=<file>`. Only the diagnostics list is used; replacements,
//! notes and the main source file are ignored.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::diagnostic::{Diagnostic, Level};
use crate::error::{AnnotateError, Result};
use crate::location::{ContentReader, FsContentReader, LocationResolver};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExportedFixes {
    #[allow(dead_code)]
    main_source_file: Option<String>,
    diagnostics: Option<Vec<ClangDiagnostic>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClangDiagnostic {
    diagnostic_name: String,
    #[serde(default)]
    level: String,
    diagnostic_message: ClangDiagnosticMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClangDiagnosticMessage {
    file_offset: usize,
    #[serde(default)]
    file_path: String,
    #[serde(default)]
    message: String,
}

/// Parses exported-fixes reports into position-resolved diagnostics.
#[derive(Clone)]
pub struct ReportParser {
    reader: Arc<dyn ContentReader>,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(Arc::new(FsContentReader))
    }
}

impl ReportParser {
    /// Create a parser that reads the report and every source file through
    /// `reader`.
    pub fn new(reader: Arc<dyn ContentReader>) -> Self {
        Self { reader }
    }

    /// Parse the report at `report_path`.
    ///
    /// A report that does not exist yields no diagnostics. Locations are
    /// resolved concurrently; the result keeps the report's order.
    pub async fn parse(&self, report_path: impl AsRef<Path>) -> Result<Vec<Diagnostic>> {
        let report_path = report_path.as_ref();
        let path_str = report_path.to_string_lossy();

        let data = match self.reader.read(&path_str).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(report = %report_path.display(), "report does not exist; no issues produced");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(AnnotateError::ReportRead {
                    path: report_path.to_path_buf(),
                    source,
                })
            }
        };

        let records = decode_records(&data).map_err(|source| AnnotateError::MalformedReport {
            path: report_path.to_path_buf(),
            source,
        })?;

        let total = records.len();
        let records: Vec<ClangDiagnostic> = records
            .into_iter()
            .filter(|d| !d.diagnostic_message.file_path.is_empty())
            .collect();
        if records.len() < total {
            debug!(
                dropped = total - records.len(),
                "dropping diagnostics without a file path"
            );
        }

        let diagnostics = self.resolve_all(records).await?;
        crate::obs::emit_report_parsed(&report_path.display().to_string(), diagnostics.len());
        Ok(diagnostics)
    }

    /// Resolve every record on its own task and reassemble by index.
    async fn resolve_all(&self, records: Vec<ClangDiagnostic>) -> Result<Vec<Diagnostic>> {
        let resolver = LocationResolver::new(Arc::clone(&self.reader));
        let mut join_set = JoinSet::new();

        for (idx, record) in records.into_iter().enumerate() {
            let resolver = resolver.clone();
            join_set.spawn(async move {
                let ClangDiagnostic {
                    diagnostic_name,
                    level,
                    diagnostic_message: msg,
                } = record;
                let location = resolver.resolve(&msg.file_path, msg.file_offset).await?;
                Ok::<(usize, Diagnostic), AnnotateError>((
                    idx,
                    Diagnostic {
                        name: diagnostic_name,
                        message: msg.message,
                        file_path: msg.file_path,
                        location,
                        level: Level::from_clang(&level),
                    },
                ))
            });
        }

        let mut slots: Vec<Option<Diagnostic>> = vec![None; join_set.len()];
        while let Some(joined) = join_set.join_next().await {
            let (idx, diagnostic) =
                joined.map_err(|e| AnnotateError::ResolverTask(e.to_string()))??;
            slots[idx] = Some(diagnostic);
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| {
                    AnnotateError::ResolverTask("missing location resolution result".to_string())
                })
            })
            .collect()
    }
}

/// Decode the diagnostics list; an empty document has none.
fn decode_records(data: &[u8]) -> std::result::Result<Vec<ClangDiagnostic>, serde_yaml::Error> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let doc: Option<ExportedFixes> = serde_yaml::from_slice(data)?;
    Ok(doc.and_then(|d| d.diagnostics).unwrap_or_default())
}

/// Group diagnostics per file, each group ordered by line then column.
///
/// Presentation helper only; parsing never reorders.
pub fn group_by_file(diagnostics: &[Diagnostic]) -> BTreeMap<&str, Vec<&Diagnostic>> {
    let mut groups: BTreeMap<&str, Vec<&Diagnostic>> = BTreeMap::new();
    for diag in diagnostics {
        groups.entry(diag.file_path.as_str()).or_default().push(diag);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|d| (d.location.line, d.location.column));
    }
    groups
}
