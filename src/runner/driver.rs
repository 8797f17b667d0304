//! The check runner: wires sequencers together and runs them to completion.
//!
//! A run makes four passes over the shared state:
//!
//! 1. **Validator pass** — for each input line, the validator sequencer is
//!    rewound and traversed linearly.
//! 2. **Rule pass** — the rule sequencer is traversed from the start;
//!    operations steer it through directives (splice, stop) and the pass
//!    ends on the exhaustion signal.
//! 3. **Assertion pass** — one linear traversal of the assertion sequencer.
//! 4. **Lookup pass** — operations are instantiated for the lookup keys
//!    recorded so far and traversed linearly.
//!
//! Directive handling: on a splice the cursor first moves past the
//! signaling entity, so a finite block is not spliced again when the cursor
//! reaches that entity later; on a stop the cursor leaves the stopped
//! block, landing on the first entity after its upper boundary. A step
//! budget bounds the whole run — an unbounded repeating block whose schema
//! never stops it is reported as a check failure, not an endless spin.

use crate::core::error::{EngineError, EngineResult, SequenceError};
use crate::core::operation::{BoxedOperation, Directive};
use crate::core::state::CheckState;
use crate::operations::registry::OperationRegistry;
use crate::reader::LineReader;
use crate::runner::report::{CheckRecord, CheckReport};
use crate::schema::loader::SchemaDocument;
use crate::sequence::pattern::AdvancePattern;
use crate::sequence::sequence::Sequence;
use crate::sequence::sequencers::{
    AssertionSequencer, LookupRegistry, LookupSequencer, RuleSequencer, ValidatorSequencer,
};
use std::time::Instant;

/// Runner options.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Maximum number of cursor steps across all passes.
    pub step_limit: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self { step_limit: 100_000 }
    }
}

impl RunnerOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step limit.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }
}

/// The check runner.
pub struct CheckRunner {
    registry: OperationRegistry,
    lookups: LookupRegistry,
    options: RunnerOptions,
}

impl CheckRunner {
    /// Create a runner with the built-in registries and default options.
    pub fn new() -> Self {
        Self {
            registry: OperationRegistry::with_builtins(),
            lookups: LookupRegistry::with_builtins(),
            options: RunnerOptions::default(),
        }
    }

    /// Create a runner with injected registries.
    pub fn with_registries(registry: OperationRegistry, lookups: LookupRegistry) -> Self {
        Self {
            registry,
            lookups,
            options: RunnerOptions::default(),
        }
    }

    /// Set the runner options.
    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// The operation registry in use.
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Check in-memory text against a JSON schema document text.
    pub fn check_text(&self, schema_json: &str, text: &str) -> EngineResult<CheckReport> {
        let schema = SchemaDocument::from_json(schema_json)?;
        self.run(&schema, LineReader::from_text(text))
    }

    /// Check a file against a schema document file.
    pub fn check_file(
        &self,
        schema_path: impl AsRef<std::path::Path>,
        input_path: impl AsRef<std::path::Path>,
    ) -> EngineResult<CheckReport> {
        let schema = SchemaDocument::from_path(schema_path)?;
        self.run(&schema, LineReader::from_path(input_path)?)
    }

    /// Run a full check of `reader` against `schema`.
    pub fn run(&self, schema: &SchemaDocument, reader: LineReader) -> EngineResult<CheckReport> {
        let start = Instant::now();
        let mut state = CheckState::new(reader);
        let mut budget = self.options.step_limit;

        // Validator pass: every line, every validator.
        let mut validators = ValidatorSequencer::from_schema(schema, &self.registry)?;
        if !validators.sequence().is_empty() && !state.reader().is_empty() {
            log::debug!(
                "validator pass: {} validator(s) over {} line(s)",
                validators.sequence().len(),
                state.reader().len()
            );
            state.results_mut().open_scope("validators");
            for line in 0..state.reader().len() {
                state.reader_mut().seek(line);
                validators.sequence_mut().reset();
                if self.traverse_reported(validators.sequence_mut(), &mut state, &mut budget)? {
                    break;
                }
            }
            state.results_mut().close_scope();
        }

        // Rule pass: directives steer the cursor.
        let mut rules = RuleSequencer::from_schema(schema, &self.registry)?;
        if !rules.sequence().is_empty() {
            log::debug!("rule pass: {} rule(s)", rules.sequence().len());
            state.reader_mut().reset();
            state.results_mut().open_scope("rules");
            self.traverse_reported(rules.sequence_mut(), &mut state, &mut budget)?;
            state.results_mut().close_scope();
        }

        // Assertion pass: file-level postconditions.
        let mut assertions = AssertionSequencer::from_schema(schema, &self.registry)?;
        if !assertions.sequence().is_empty() {
            log::debug!("assertion pass: {} assertion(s)", assertions.sequence().len());
            state.results_mut().open_scope("assertions");
            self.traverse_reported(assertions.sequence_mut(), &mut state, &mut budget)?;
            state.results_mut().close_scope();
        }

        // Lookup pass: resolve the keys recorded during the rule pass.
        let mut lookup_seq = LookupSequencer::from_results(state.results(), &self.lookups)?;
        if !lookup_seq.sequence().is_empty() {
            log::debug!("lookup pass: {} lookup(s)", lookup_seq.sequence().len());
            state.results_mut().open_scope("lookups");
            self.traverse_reported(lookup_seq.sequence_mut(), &mut state, &mut budget)?;
            state.results_mut().close_scope();
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let report = CheckReport::from_results(state.into_results(), duration_ms);
        log::info!("run {}: {}", report.run_id, report.summary());
        Ok(report)
    }

    /// Traverse, converting a tripped step budget into a recorded failure.
    ///
    /// Returns whether the budget tripped; other errors propagate.
    fn traverse_reported(
        &self,
        seq: &mut Sequence<BoxedOperation>,
        state: &mut CheckState,
        budget: &mut usize,
    ) -> EngineResult<bool> {
        match self.traverse(seq, state, budget) {
            Ok(()) => Ok(false),
            Err(EngineError::StepLimitExceeded { limit }) => {
                log::warn!("step limit {} exceeded, aborting pass", limit);
                state.results_mut().record(CheckRecord {
                    operation: "driver".to_string(),
                    line: None,
                    passed: false,
                    message: format!(
                        "step limit {} exceeded; a repeating block never stopped",
                        limit
                    ),
                });
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Pull current entities and apply them until the sequence exhausts.
    ///
    /// The exhaustion signal is probed through `advance`: when the cursor
    /// rests just past the linear end, `current` has no valid position and
    /// the next `advance` reports [`SequenceError::Exhausted`] — the one
    /// signal this loop is meant to catch. A degenerate empty loop wraps in
    /// place instead of exhausting and runs the step budget down.
    fn traverse(
        &self,
        seq: &mut Sequence<BoxedOperation>,
        state: &mut CheckState,
        budget: &mut usize,
    ) -> EngineResult<()> {
        loop {
            if *budget == 0 {
                return Err(EngineError::StepLimitExceeded {
                    limit: self.options.step_limit,
                });
            }
            *budget -= 1;

            // Probe the cursor first: past the linear end `current` has no
            // valid position and the next advance reports the exhaustion
            // signal; a degenerate empty loop wraps in place instead.
            if seq.current().is_err() {
                match seq.advance() {
                    Err(SequenceError::Exhausted) => break,
                    Ok(()) => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            let directive = seq.current()?.apply(state)?;

            match directive {
                Directive::Continue => {
                    if advance_or_done(seq)? {
                        break;
                    }
                }
                Directive::Splice { operations, repeat } => {
                    // Move past the signaling entity before splicing so the
                    // block lands after it and is never re-spliced.
                    advance_or_done(seq)?;
                    seq.insert(operations, repeat);
                }
                Directive::StopRepeating => {
                    let block_end = match seq.pattern() {
                        AdvancePattern::Loop { end, .. } => Some(end),
                        AdvancePattern::Linear => None,
                    };
                    seq.stop_repeating();
                    match block_end {
                        Some(end) => {
                            // Leave the stopped block: the cursor lands on
                            // the first entity past its upper boundary.
                            let mut done = false;
                            while seq.index() < end {
                                if advance_or_done(seq)? {
                                    done = true;
                                    break;
                                }
                            }
                            if done {
                                break;
                            }
                        }
                        None => {
                            if advance_or_done(seq)? {
                                break;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for CheckRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Advance, mapping the exhaustion signal to `true` (traversal complete).
fn advance_or_done(seq: &mut Sequence<BoxedOperation>) -> EngineResult<bool> {
    match seq.advance() {
        Ok(()) => Ok(false),
        Err(SequenceError::Exhausted) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(schema: &str, text: &str) -> CheckReport {
        CheckRunner::new().check_text(schema, text).unwrap()
    }

    #[test]
    fn test_linear_rules_pass_on_matching_input() {
        let report = run(
            r#"{ "rules": [
                { "op": "expect_line", "params": { "equals": "BEGIN" } },
                { "op": "expect_line", "params": { "equals": "END" } }
            ] }"#,
            "BEGIN\nEND",
        );
        assert!(report.success, "failures: {:?}", report.detailed_failures());
        assert_eq!(report.records, 2);
    }

    #[test]
    fn test_mismatch_is_reported_with_line() {
        let report = run(
            r#"{ "rules": [{ "op": "expect_line", "params": { "equals": "BEGIN" } }] }"#,
            "WRONG",
        );
        assert!(!report.success);
        assert_eq!(report.results.failures()[0].line, Some(1));
    }

    #[test]
    fn test_unbounded_repeat_with_until_terminator() {
        // until leads the block so the terminator is seen before another
        // item line is demanded; an empty item list stays valid.
        let schema = r#"{ "rules": [
            { "op": "expect_line", "params": { "equals": "BEGIN" } },
            { "op": "repeat", "params": { "rules": [
                { "op": "until", "params": { "terminator": "END", "consume": true } },
                { "op": "expect_line", "params": { "prefix": "- " } }
            ] } }
        ] }"#;

        let report = run(schema, "BEGIN\n- a\n- b\n- c\nEND");
        assert!(report.success, "failures: {:?}", report.detailed_failures());

        let report = run(schema, "BEGIN\nEND");
        assert!(report.success, "failures: {:?}", report.detailed_failures());

        let report = run(schema, "BEGIN\n- a\nplain\nEND");
        assert!(!report.success);
    }

    #[test]
    fn test_rules_after_stopped_block_still_run() {
        let schema = r#"{ "rules": [
            { "op": "repeat", "params": { "rules": [
                { "op": "until", "params": { "terminator": "END", "consume": true } },
                { "op": "expect_line", "params": { "prefix": "- " } }
            ] } },
            { "op": "expect_line", "params": { "equals": "tail" } }
        ] }"#;
        let report = run(schema, "- a\nEND\ntail");
        assert!(report.success, "failures: {:?}", report.detailed_failures());

        let report = run(schema, "- a\nEND\nother");
        assert!(!report.success);
    }

    #[test]
    fn test_finite_repeat_unrolls() {
        let schema = r#"{ "rules": [
            { "op": "repeat", "params": { "count": 3, "rules": [
                { "op": "expect_line", "params": { "prefix": "- " } }
            ] } }
        ] }"#;
        let report = run(schema, "- a\n- b\n- c");
        assert!(report.success, "failures: {:?}", report.detailed_failures());
        assert_eq!(report.records, 3);

        // Too few item lines: the third expectation fails on exhausted
        // input.
        let report = run(schema, "- a\n- b");
        assert!(!report.success);
    }

    #[test]
    fn test_finite_repeat_of_zero_is_noop() {
        let schema = r#"{ "rules": [
            { "op": "repeat", "params": { "count": 0, "rules": [
                { "op": "expect_line", "params": { "prefix": "- " } }
            ] } }
        ] }"#;
        let report = run(schema, "anything");
        assert!(report.success);
        assert_eq!(report.records, 0);
    }

    #[test]
    fn test_unterminated_unbounded_block_trips_step_limit() {
        // The block consumes no lines and never stops, so only the step
        // budget ends the pass — reported as a failure, not an error.
        let runner =
            CheckRunner::new().with_options(RunnerOptions::new().with_step_limit(200));
        let schema = SchemaDocument::from_json(
            r#"{ "rules": [{ "op": "repeat", "params": { "rules": [
                { "op": "skip_blank" }
            ] } }] }"#,
        )
        .unwrap();
        let report = runner.run(&schema, LineReader::from_text("x")).unwrap();
        assert!(!report.success);
        assert!(report.results.failures()[0]
            .message
            .contains("step limit"));
    }

    #[test]
    fn test_degenerate_empty_repeat_trips_step_limit() {
        let runner =
            CheckRunner::new().with_options(RunnerOptions::new().with_step_limit(100));
        let schema = SchemaDocument::from_json(
            r#"{ "rules": [{ "op": "repeat", "params": { "rules": [] } }] }"#,
        )
        .unwrap();
        let report = runner.run(&schema, LineReader::from_text("x")).unwrap();
        assert!(!report.success);
    }

    #[test]
    fn test_validator_pass_checks_every_line() {
        let report = run(
            r#"{ "validators": [{ "op": "max_length", "params": { "limit": 4 } }] }"#,
            "ok\nlonger line\nfine",
        );
        assert!(!report.success);
        let failures = report.results.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].line, Some(2));
    }

    #[test]
    fn test_assertions_run_after_rules() {
        let report = run(
            r#"{
                "rules": [{ "op": "expect_line" }],
                "assertions": [{ "op": "line_count", "params": { "min": 2, "max": 2 } }]
            }"#,
            "a\nb",
        );
        assert!(report.success, "failures: {:?}", report.detailed_failures());

        let report = run(
            r#"{ "assertions": [{ "op": "line_count", "params": { "min": 3 } }] }"#,
            "a\nb",
        );
        assert!(!report.success);
    }

    #[test]
    fn test_lookup_pass_resolves_recorded_keys() {
        let schema = r#"{ "rules": [
            { "op": "lookup", "params": { "key": "line_ref:2" } },
            { "op": "lookup", "params": { "key": "line_ref:9" } }
        ] }"#;
        let report = run(schema, "a\nb");
        assert!(!report.success);
        let failures = report.results.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("out of range"));
    }

    #[test]
    fn test_unknown_lookup_key_aborts_the_run() {
        let result = CheckRunner::new().check_text(
            r#"{ "rules": [{ "op": "lookup", "params": { "key": "mystery:x" } }] }"#,
            "a",
        );
        assert!(matches!(
            result,
            Err(EngineError::UnknownLookup { key, .. }) if key == "mystery:x"
        ));
    }

    #[test]
    fn test_empty_schema_on_empty_input_succeeds() {
        let report = run("{}", "");
        assert!(report.success);
        assert_eq!(report.records, 0);
    }

    #[test]
    fn test_scopes_group_records_by_pass() {
        let report = run(
            r#"{
                "rules": [{ "op": "expect_line" }],
                "validators": [{ "op": "max_length", "params": { "limit": 1 } }],
                "assertions": [{ "op": "line_count", "params": { "min": 1 } }]
            }"#,
            "abc",
        );
        let labels: Vec<&str> = report
            .results
            .root()
            .children
            .iter()
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(labels, vec!["validators", "rules", "assertions"]);
    }

    #[test]
    fn test_check_file_round_trip() {
        use std::io::Write;
        let mut schema = tempfile::NamedTempFile::new().unwrap();
        schema
            .write_all(br#"{ "rules": [{ "op": "expect_line", "params": { "equals": "hi" } }] }"#)
            .unwrap();
        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(b"hi\n").unwrap();

        let report = CheckRunner::new()
            .check_file(schema.path(), input.path())
            .unwrap();
        assert!(report.success);
    }
}
