//! Byte offset to line/column resolution.
//!
//! File content is obtained through a [`ContentReader`] so callers can swap
//! the filesystem for synthetic content (see [`crate::fakes`]).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::diagnostic::Location;
use crate::error::{AnnotateError, Result};

/// Source of full file contents, keyed by path.
#[async_trait]
pub trait ContentReader: Send + Sync {
    /// Read the whole file at `path`.
    ///
    /// Content is raw bytes; sources are not required to be UTF-8.
    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// Reads files from local storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsContentReader;

#[async_trait]
impl ContentReader for FsContentReader {
    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Find the 1-based line and column of a 0-based byte `offset`.
///
/// Returns `None` when `offset` is not inside `content`.
pub fn locate(content: &[u8], offset: usize) -> Option<(u32, u32)> {
    if offset >= content.len() {
        return None;
    }

    let before = &content[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let column = offset - line_start + 1;

    Some((line as u32, column as u32))
}

/// Resolves `(path, offset)` pairs against current file content.
#[derive(Clone)]
pub struct LocationResolver {
    reader: Arc<dyn ContentReader>,
}

impl LocationResolver {
    pub fn new(reader: Arc<dyn ContentReader>) -> Self {
        Self { reader }
    }

    /// Read `path` and resolve `offset` inside it.
    ///
    /// An offset past the end of the file (typically a report produced
    /// against an older revision) is fatal.
    pub async fn resolve(&self, path: &str, offset: usize) -> Result<Location> {
        let content = self
            .reader
            .read(path)
            .await
            .map_err(|source| AnnotateError::SourceRead {
                path: path.to_string(),
                source,
            })?;

        match locate(&content, offset) {
            Some((line, column)) => Ok(Location {
                offset,
                line,
                column,
            }),
            None => {
                debug!(path = %path, offset = offset, len = content.len(), "offset out of range");
                Err(AnnotateError::OffsetOutOfRange {
                    path: path.to_string(),
                    offset,
                    len: content.len(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryContentReader;
    use std::io::Write;

    fn resolver_with(path: &str, content: &str) -> LocationResolver {
        let reader = MemoryContentReader::new().with_file(path, content);
        LocationResolver::new(Arc::new(reader))
    }

    #[test]
    fn test_locate_offset_zero() {
        assert_eq!(locate(b"int main() {}", 0), Some((1, 1)));
    }

    #[test]
    fn test_locate_after_newline() {
        assert_eq!(locate(b"abc\ndef", 4), Some((2, 1)));
    }

    #[test]
    fn test_locate_on_newline_belongs_to_its_line() {
        assert_eq!(locate(b"abc\ndef", 3), Some((1, 4)));
    }

    #[test]
    fn test_locate_last_byte() {
        assert_eq!(locate(b"abc\ndef", 6), Some((2, 3)));
    }

    #[test]
    fn test_locate_out_of_range() {
        assert_eq!(locate(b"abc", 3), None);
        assert_eq!(locate(b"abc", 100), None);
        assert_eq!(locate(b"", 0), None);
    }

    #[test]
    fn test_locate_counts_bytes_not_chars() {
        // "é" is two bytes, so 'x' sits at byte offset 2 on column 3.
        assert_eq!(locate("éx".as_bytes(), 2), Some((1, 3)));
    }

    #[test]
    fn test_locate_crlf_line_endings() {
        assert_eq!(locate(b"a\r\nb", 3), Some((2, 1)));
    }

    #[tokio::test]
    async fn test_resolve_returns_location() {
        let resolver = resolver_with("a.cpp", "abc\ndef");
        let loc = resolver.resolve("a.cpp", 5).await.expect("resolve");
        assert_eq!(
            loc,
            Location {
                offset: 5,
                line: 2,
                column: 2
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_out_of_range_fails() {
        let resolver = resolver_with("a.cpp", "abc\ndef");
        let err = resolver.resolve("a.cpp", 7).await.unwrap_err();
        assert!(matches!(
            err,
            AnnotateError::OffsetOutOfRange {
                offset: 7,
                len: 7,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_resolve_missing_file_fails() {
        let resolver = resolver_with("a.cpp", "abc");
        let err = resolver.resolve("b.cpp", 0).await.unwrap_err();
        assert!(matches!(err, AnnotateError::SourceRead { .. }));
    }

    #[tokio::test]
    async fn test_fs_reader_reads_real_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "first\nsecond\n").expect("write");
        let path = file.path().to_string_lossy().to_string();

        let resolver = LocationResolver::new(Arc::new(FsContentReader));
        let loc = resolver.resolve(&path, 8).await.expect("resolve");
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 3);
    }

    #[tokio::test]
    async fn test_resolve_non_utf8_source() {
        // Latin-1 "é" is the single byte 0xE9.
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"caf\xe9;\nint x;\n").expect("write");
        let path = file.path().to_string_lossy().to_string();

        let resolver = LocationResolver::new(Arc::new(FsContentReader));
        let loc = resolver.resolve(&path, 10).await.expect("resolve");
        assert_eq!((loc.line, loc.column), (2, 5));
    }
}
