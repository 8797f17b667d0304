//! Result accumulation and the final check report.
//!
//! Outcomes accumulate in a small forest: each pass opens a scope node,
//! operations append records to the node currently open, and nested scopes
//! become child nodes. The forest also collects lookup requests — the
//! ordered key list the lookup sequencer is built from after the rule pass.

use crate::core::error::RunId;
use serde::{Deserialize, Serialize};

/// One recorded check outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckRecord {
    /// Name of the operation that produced this record.
    pub operation: String,
    /// 1-based input line the record concerns, if line-scoped.
    pub line: Option<usize>,
    /// Whether the check passed.
    pub passed: bool,
    /// Human-readable description of the outcome.
    pub message: String,
}

/// A lookup requested during the rule pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupRequest {
    /// The lookup-key text, e.g. `line_ref:12`.
    pub key: String,
    /// Name of the operation that requested it.
    pub requested_by: String,
}

/// One node of the result forest.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResultNode {
    /// Scope label, e.g. `rules`.
    pub label: String,
    /// Records appended directly to this scope.
    pub records: Vec<CheckRecord>,
    /// Nested scopes.
    pub children: Vec<ResultNode>,
}

impl ResultNode {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Records in this scope and all nested scopes, depth first.
    pub fn walk_records(&self) -> Vec<&CheckRecord> {
        let mut out: Vec<&CheckRecord> = self.records.iter().collect();
        for child in &self.children {
            out.extend(child.walk_records());
        }
        out
    }
}

/// The hierarchical accumulation of check outcomes for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    root: ResultNode,
    lookups: Vec<LookupRequest>,
    /// Path of child indices from the root to the open scope.
    #[serde(skip)]
    path: Vec<usize>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self {
            root: ResultNode::new("check"),
            lookups: Vec::new(),
            path: Vec::new(),
        }
    }

    fn open_node(&mut self) -> &mut ResultNode {
        let mut node = &mut self.root;
        for &idx in &self.path {
            node = &mut node.children[idx];
        }
        node
    }

    /// Open a nested scope; subsequent records land inside it.
    pub fn open_scope(&mut self, label: impl Into<String>) {
        let node = self.open_node();
        node.children.push(ResultNode::new(label));
        let idx = node.children.len() - 1;
        self.path.push(idx);
    }

    /// Close the innermost open scope. No effect at the root.
    pub fn close_scope(&mut self) {
        self.path.pop();
    }

    /// Append a record to the open scope.
    pub fn record(&mut self, record: CheckRecord) {
        self.open_node().records.push(record);
    }

    /// Request a lookup to be resolved after the rule pass.
    pub fn request_lookup(&mut self, key: impl Into<String>, requested_by: impl Into<String>) {
        self.lookups.push(LookupRequest {
            key: key.into(),
            requested_by: requested_by.into(),
        });
    }

    /// The requested lookup keys, in request order.
    pub fn lookups(&self) -> Vec<&str> {
        self.lookups.iter().map(|r| r.key.as_str()).collect()
    }

    /// The full lookup requests, in request order.
    pub fn lookup_requests(&self) -> &[LookupRequest] {
        &self.lookups
    }

    /// The root of the forest.
    pub fn root(&self) -> &ResultNode {
        &self.root
    }

    /// Total number of records across all scopes.
    pub fn record_count(&self) -> usize {
        self.root.walk_records().len()
    }

    /// Number of failed records across all scopes.
    pub fn failure_count(&self) -> usize {
        self.root.walk_records().iter().filter(|r| !r.passed).count()
    }

    /// All failed records, depth first.
    pub fn failures(&self) -> Vec<&CheckRecord> {
        self.root
            .walk_records()
            .into_iter()
            .filter(|r| !r.passed)
            .collect()
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Final report of one check run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// Identity of this run.
    pub run_id: RunId,
    /// Whether every record passed.
    pub success: bool,
    /// Number of records produced.
    pub records: usize,
    /// Number of failed records.
    pub failures: usize,
    /// The full result forest.
    pub results: ResultSet,
    /// Time taken for the run in milliseconds.
    pub duration_ms: u64,
}

impl CheckReport {
    /// Assemble a report from an accumulated result set.
    pub fn from_results(results: ResultSet, duration_ms: u64) -> Self {
        let records = results.record_count();
        let failures = results.failure_count();
        Self {
            run_id: RunId::new(),
            success: failures == 0,
            records,
            failures,
            results,
            duration_ms,
        }
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.success {
            format!("✓ Input is valid ({} check(s) passed)", self.records)
        } else {
            format!(
                "✗ Validation failed: {} of {} check(s) failed",
                self.failures, self.records
            )
        }
    }

    /// Numbered failure messages with line context.
    pub fn detailed_failures(&self) -> Vec<String> {
        self.results
            .failures()
            .iter()
            .enumerate()
            .map(|(i, record)| match record.line {
                Some(line) => format!(
                    "{}. [{}] line {}: {}",
                    i + 1,
                    record.operation,
                    line,
                    record.message
                ),
                None => format!("{}. [{}] {}", i + 1, record.operation, record.message),
            })
            .collect()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(op: &str, passed: bool) -> CheckRecord {
        CheckRecord {
            operation: op.to_string(),
            line: Some(1),
            passed,
            message: "msg".to_string(),
        }
    }

    #[test]
    fn test_records_land_in_open_scope() {
        let mut results = ResultSet::new();
        results.open_scope("rules");
        results.record(record("expect_line", true));
        results.close_scope();
        results.open_scope("assertions");
        results.record(record("line_count", false));
        results.close_scope();

        assert_eq!(results.record_count(), 2);
        assert_eq!(results.failure_count(), 1);
        assert_eq!(results.root().children.len(), 2);
        assert_eq!(results.root().children[0].label, "rules");
        assert_eq!(results.root().children[1].records[0].operation, "line_count");
    }

    #[test]
    fn test_nested_scopes_form_a_forest() {
        let mut results = ResultSet::new();
        results.open_scope("rules");
        results.open_scope("repeat");
        results.record(record("expect_line", true));
        results.close_scope();
        results.record(record("until", true));
        results.close_scope();

        let rules = &results.root().children[0];
        assert_eq!(rules.children[0].label, "repeat");
        assert_eq!(rules.records.len(), 1);
        assert_eq!(results.record_count(), 2);
    }

    #[test]
    fn test_lookup_requests_keep_order() {
        let mut results = ResultSet::new();
        results.request_lookup("line_ref:3", "expect_line");
        results.request_lookup("note:checked", "lookup");
        assert_eq!(results.lookups(), vec!["line_ref:3", "note:checked"]);
        assert_eq!(results.lookup_requests()[1].requested_by, "lookup");
    }

    #[test]
    fn test_report_summary() {
        let mut results = ResultSet::new();
        results.record(record("a", true));
        let report = CheckReport::from_results(results, 5);
        assert!(report.success);
        assert!(report.summary().starts_with('✓'));

        let mut results = ResultSet::new();
        results.record(record("a", false));
        let report = CheckReport::from_results(results, 5);
        assert!(!report.success);
        assert_eq!(report.failures, 1);
        assert!(report.detailed_failures()[0].contains("line 1"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = CheckReport::from_results(ResultSet::new(), 0);
        let json = report.to_json().unwrap();
        assert!(json.contains("run_id"));
        assert!(json.contains("success"));
    }
}
