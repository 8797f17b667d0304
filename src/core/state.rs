//! The shared state operations apply against.
//!
//! [`CheckState`] is the opaque handle handed to [`Operation::apply`]: a
//! line cursor over the input plus the result forest outcomes accumulate
//! in. Operations read lines through the reader and report through the
//! recording helpers; the state owns both ends of that data flow.
//!
//! [`Operation::apply`]: crate::core::operation::Operation::apply

use crate::reader::LineReader;
use crate::runner::report::{CheckRecord, ResultSet};

/// Shared state for one check run.
#[derive(Debug, Clone)]
pub struct CheckState {
    reader: LineReader,
    results: ResultSet,
}

impl CheckState {
    /// Create state over the given input.
    pub fn new(reader: LineReader) -> Self {
        Self {
            reader,
            results: ResultSet::new(),
        }
    }

    /// The input line cursor.
    pub fn reader(&self) -> &LineReader {
        &self.reader
    }

    /// Mutable access to the input line cursor.
    pub fn reader_mut(&mut self) -> &mut LineReader {
        &mut self.reader
    }

    /// The accumulated results.
    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Mutable access to the accumulated results.
    pub fn results_mut(&mut self) -> &mut ResultSet {
        &mut self.results
    }

    /// Consume the state, keeping the results.
    pub fn into_results(self) -> ResultSet {
        self.results
    }

    /// Record a passing outcome at the current line.
    pub fn record_pass(&mut self, operation: &str, message: impl Into<String>) {
        let line = self.current_line_number();
        self.results.record(CheckRecord {
            operation: operation.to_string(),
            line,
            passed: true,
            message: message.into(),
        });
    }

    /// Record a failing outcome at the current line.
    pub fn record_fail(&mut self, operation: &str, message: impl Into<String>) {
        let line = self.current_line_number();
        self.results.record(CheckRecord {
            operation: operation.to_string(),
            line,
            passed: false,
            message: message.into(),
        });
    }

    /// Record an outcome with no line context (file-level checks).
    pub fn record_file_level(&mut self, operation: &str, passed: bool, message: impl Into<String>) {
        self.results.record(CheckRecord {
            operation: operation.to_string(),
            line: None,
            passed,
            message: message.into(),
        });
    }

    fn current_line_number(&self) -> Option<usize> {
        if self.reader.at_end() {
            None
        } else {
            Some(self.reader.line_number())
        }
    }
}
