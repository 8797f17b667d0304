//! Built-in lookup operations: LineRef, Note
//!
//! Lookups are constructed per recorded key after the rule pass, through
//! the injected [`LookupRegistry`]. The name part of the key (before the
//! first `:`) selects the constructor; the rest is the payload.

use crate::core::error::EngineResult;
use crate::core::operation::{BoxedOperation, Directive, Operation, OperationInfo, OperationKind};
use crate::core::state::CheckState;
use crate::sequence::sequencers::LookupRegistry;

/// Register lookup constructors.
pub fn register(registry: &mut LookupRegistry) {
    registry.register("line_ref", |key, _results, requested_by| {
        Ok(Box::new(LineRef::new(key, requested_by)) as BoxedOperation)
    });
    registry.register("note", |key, _results, requested_by| {
        Ok(Box::new(Note::new(key, requested_by)) as BoxedOperation)
    });
}

/// The payload after the key's name part.
fn payload(key: &str) -> &str {
    key.splitn(2, ':').nth(1).unwrap_or("")
}

// ============================================================================
// LineRef
// ============================================================================

/// Resolve a `line_ref:<n>` key: the payload must parse as a 1-based line
/// number within the input.
#[derive(Debug, Clone)]
pub struct LineRef {
    payload: String,
    requested_by: String,
}

impl LineRef {
    fn new(key: &str, requested_by: &str) -> Self {
        Self {
            payload: payload(key).to_string(),
            requested_by: requested_by.to_string(),
        }
    }
}

impl Operation for LineRef {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "line_ref",
            OperationKind::Lookup,
            "Referenced line number must exist in the input",
        )
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        let total = state.reader().len();
        match self.payload.parse::<usize>() {
            Ok(n) if n >= 1 && n <= total => {
                state.record_file_level(
                    "line_ref",
                    true,
                    format!("line {} exists (requested by {})", n, self.requested_by),
                );
            }
            Ok(n) => {
                state.record_file_level(
                    "line_ref",
                    false,
                    format!(
                        "line {} out of range 1..={} (requested by {})",
                        n, total, self.requested_by
                    ),
                );
            }
            Err(_) => {
                state.record_file_level(
                    "line_ref",
                    false,
                    format!(
                        "{:?} is not a line number (requested by {})",
                        self.payload, self.requested_by
                    ),
                );
            }
        }
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}

// ============================================================================
// Note
// ============================================================================

/// Resolve a `note:<text>` key by recording the payload as an
/// informational, always-passing outcome.
#[derive(Debug, Clone)]
pub struct Note {
    payload: String,
    requested_by: String,
}

impl Note {
    fn new(key: &str, requested_by: &str) -> Self {
        Self {
            payload: payload(key).to_string(),
            requested_by: requested_by.to_string(),
        }
    }
}

impl Operation for Note {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "note",
            OperationKind::Lookup,
            "Record the payload as an informational outcome",
        )
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        state.record_file_level(
            "note",
            true,
            format!("{} (from {})", self.payload, self.requested_by),
        );
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LineReader;

    fn state(text: &str) -> CheckState {
        CheckState::new(LineReader::from_text(text))
    }

    #[test]
    fn test_line_ref_in_range() {
        let op = LineRef::new("line_ref:2", "rule");
        let mut st = state("a\nb\nc");
        op.apply(&mut st).unwrap();
        assert_eq!(st.results().failure_count(), 0);
    }

    #[test]
    fn test_line_ref_out_of_range() {
        let op = LineRef::new("line_ref:9", "rule");
        let mut st = state("a");
        op.apply(&mut st).unwrap();
        let failures = st.results().failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("out of range"));
    }

    #[test]
    fn test_line_ref_non_numeric_payload() {
        let op = LineRef::new("line_ref:abc", "rule");
        let mut st = state("a");
        op.apply(&mut st).unwrap();
        assert_eq!(st.results().failure_count(), 1);
    }

    #[test]
    fn test_line_ref_zero_is_out_of_range() {
        let op = LineRef::new("line_ref:0", "rule");
        let mut st = state("a");
        op.apply(&mut st).unwrap();
        assert_eq!(st.results().failure_count(), 1);
    }

    #[test]
    fn test_note_records_payload() {
        let op = Note::new("note:reviewed by ops", "lookup");
        let mut st = state("a");
        op.apply(&mut st).unwrap();
        let record = &st.results().root().records[0];
        assert!(record.passed);
        assert!(record.message.contains("reviewed by ops"));
    }

    #[test]
    fn test_builtin_registration() {
        let registry = LookupRegistry::with_builtins();
        assert!(registry.contains("line_ref"));
        assert!(registry.contains("note"));
    }
}
