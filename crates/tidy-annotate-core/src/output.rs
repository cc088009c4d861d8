//! Workflow-command log lines.
//!
//! Each diagnostic becomes one `::error file=..,line=..,col=..::message`
//! line that the CI runner turns into an inline annotation. There is no
//! per-request cap here, so nothing is batched.

use std::io::Write;
use std::path::Path;

use crate::diagnostic::{Diagnostic, Level};

/// Escape free-text message data.
pub fn escape_data(s: &str) -> String {
    s.replace('\r', "%0D").replace('\n', "%0A")
}

/// Escape a property value such as the file path.
pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(']', "%5D").replace(';', "%3B")
}

fn command(level: Level) -> &'static str {
    match level {
        Level::Failure => "error",
        Level::Notice => "notice",
    }
}

/// Render one diagnostic. `display_path` is the path shown to the reader.
pub fn format_line(diag: &Diagnostic, display_path: &str) -> String {
    let message = format!("{} ({})", diag.message, diag.name);
    format!(
        "::{command} file={file},line={line},col={col}::{message}",
        command = command(diag.level),
        file = escape_property(display_path),
        line = diag.location.line,
        col = diag.location.column,
        message = escape_data(&message),
    )
}

/// Path relative to `base` when it lies beneath it, otherwise unchanged.
pub fn display_path(file_path: &str, base: &Path) -> String {
    let path = Path::new(file_path);
    match path.strip_prefix(base) {
        Ok(rel) if path.is_absolute() => rel.to_string_lossy().into_owned(),
        _ => file_path.to_string(),
    }
}

/// Writes diagnostics to a log stream, one line each.
pub struct LogFormatter<'a> {
    base: &'a Path,
}

impl<'a> LogFormatter<'a> {
    /// Paths under `base` are shown relative to it.
    pub fn new(base: &'a Path) -> Self {
        Self { base }
    }

    pub fn emit<'d, W, I>(&self, out: &mut W, diagnostics: I) -> std::io::Result<usize>
    where
        W: Write,
        I: IntoIterator<Item = &'d Diagnostic>,
    {
        let mut written = 0;
        for diag in diagnostics {
            let path = display_path(&diag.file_path, self.base);
            writeln!(out, "{}", format_line(diag, &path))?;
            written += 1;
        }
        out.flush()?;
        Ok(written)
    }
}
