//! Line-by-line access to the input text under check.
//!
//! The reader splits the input once at construction and exposes a cursor
//! over its lines. Rule operations consume lines through the cursor; the
//! validator pass seeks to each line in turn; assertions look at the whole
//! line list after the rule pass.

use crate::core::error::EngineResult;
use std::fs;
use std::path::Path;

/// A cursor over the lines of one input text.
#[derive(Debug, Clone)]
pub struct LineReader {
    lines: Vec<String>,
    cursor: usize,
}

impl LineReader {
    /// Read and split the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        Ok(Self::from_text(&fs::read_to_string(path)?))
    }

    /// Split an in-memory text.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(String::from).collect(),
            cursor: 0,
        }
    }

    /// The line under the cursor, or `None` past the end.
    pub fn current(&self) -> Option<&str> {
        self.lines.get(self.cursor).map(String::as_str)
    }

    /// Move the cursor one line forward. Returns false once past the end.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.lines.len() {
            self.cursor += 1;
        }
        self.cursor < self.lines.len()
    }

    /// Whether the cursor has passed the last line.
    pub fn at_end(&self) -> bool {
        self.cursor >= self.lines.len()
    }

    /// 1-based number of the current line (for reporting). Past the end
    /// this is one beyond the last line.
    pub fn line_number(&self) -> usize {
        self.cursor + 1
    }

    /// Jump the cursor to a 0-based line index.
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.lines.len());
    }

    /// Rewind the cursor to the first line.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Total number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the input had no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cursor_walks_lines_in_order() {
        let mut reader = LineReader::from_text("one\ntwo\nthree");
        assert_eq!(reader.current(), Some("one"));
        assert_eq!(reader.line_number(), 1);
        assert!(reader.advance());
        assert_eq!(reader.current(), Some("two"));
        assert!(reader.advance());
        assert!(!reader.advance());
        assert!(reader.at_end());
        assert_eq!(reader.current(), None);
    }

    #[test]
    fn test_empty_text_is_immediately_at_end() {
        let reader = LineReader::from_text("");
        assert!(reader.is_empty());
        assert!(reader.at_end());
        assert_eq!(reader.current(), None);
    }

    #[test]
    fn test_trailing_newline_does_not_add_a_line() {
        let reader = LineReader::from_text("a\nb\n");
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn test_seek_clamps_to_end() {
        let mut reader = LineReader::from_text("a\nb");
        reader.seek(10);
        assert!(reader.at_end());
        reader.seek(1);
        assert_eq!(reader.current(), Some("b"));
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha").unwrap();
        writeln!(file, "beta").unwrap();
        let reader = LineReader::from_path(file.path()).unwrap();
        assert_eq!(reader.lines(), &["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_from_path_missing_file_is_io_error() {
        let result = LineReader::from_path("/tmp/veriline-no-such-file-12345.txt");
        assert!(matches!(
            result,
            Err(crate::core::error::EngineError::Io(_))
        ));
    }
}
