//! Built-in rule operations: ExpectLine, SkipBlank, RepeatRule, Until, RequestLookup
//!
//! Rules run in schema order against the input lines. Matching rules record
//! pass and fail outcomes; structural rules (repeat, until) steer the
//! sequencer through splice directives instead.

use crate::core::error::{EngineResult, SchemaError};
use crate::core::operation::{BoxedOperation, Directive, Operation, OperationInfo, OperationKind};
use crate::core::state::CheckState;
use crate::core::types::{ParamMap, Value, ValueType};
use crate::operations::registry::OperationRegistry;
use crate::schema::params::{validate_params, ParameterSchema, ParameterSpec};
use crate::sequence::pattern::Repeat;

/// Register rule operations.
pub fn register(registry: &mut OperationRegistry) {
    registry.register(
        "expect_line",
        OperationKind::Rule,
        "Match the current line and consume it",
        Some(ExpectLine::parameter_schema()),
        |_, params| ExpectLine::from_params(params).map(|op| Box::new(op) as BoxedOperation),
    );
    registry.register(
        "skip_blank",
        OperationKind::Rule,
        "Advance past consecutive blank lines",
        None,
        |_, _| Ok(Box::new(SkipBlank) as BoxedOperation),
    );
    registry.register(
        "repeat",
        OperationKind::Rule,
        "Splice a nested rule block, unrolled or as an active loop",
        Some(RepeatRule::parameter_schema()),
        |registry, params| {
            RepeatRule::from_params(registry, params).map(|op| Box::new(op) as BoxedOperation)
        },
    );
    registry.register(
        "until",
        OperationKind::Rule,
        "Stop an active repeating block on a terminator line",
        Some(Until::parameter_schema()),
        |_, params| Until::from_params(params).map(|op| Box::new(op) as BoxedOperation),
    );
    registry.register(
        "lookup",
        OperationKind::Rule,
        "Request a lookup to be resolved after the rule pass",
        Some(RequestLookup::parameter_schema()),
        |_, params| RequestLookup::from_params(params).map(|op| Box::new(op) as BoxedOperation),
    );
}

/// Wrap a parameter failure in the loader's error type.
fn invalid(op: &str, source: crate::core::error::ParameterError) -> SchemaError {
    SchemaError::InvalidParams {
        op: op.to_string(),
        source,
    }
}

// ============================================================================
// ExpectLine
// ============================================================================

/// Match the current line against the declared matchers and consume it.
///
/// All supplied matchers must hold. With none supplied the rule only
/// requires that a line is present, which makes it a one-line consumer.
#[derive(Debug, Clone)]
pub struct ExpectLine {
    equals: Option<String>,
    prefix: Option<String>,
    contains: Option<String>,
}

impl ExpectLine {
    fn parameter_schema() -> ParameterSchema {
        ParameterSchema::new()
            .with("equals", ParameterSpec::new(ValueType::String).optional())
            .with("prefix", ParameterSpec::new(ValueType::String).optional())
            .with("contains", ParameterSpec::new(ValueType::String).optional())
    }

    /// Construct from a parameter map, self-checking against the schema.
    pub fn from_params(mut params: ParamMap) -> Result<Self, SchemaError> {
        validate_params("expect_line", &Self::parameter_schema(), &mut params)
            .map_err(|e| invalid("expect_line", e))?;
        Ok(Self {
            equals: params.get("equals").and_then(Value::as_str).map(String::from),
            prefix: params.get("prefix").and_then(Value::as_str).map(String::from),
            contains: params
                .get("contains")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }

    fn matches(&self, line: &str) -> bool {
        self.equals.as_deref().map_or(true, |e| line == e)
            && self.prefix.as_deref().map_or(true, |p| line.starts_with(p))
            && self.contains.as_deref().map_or(true, |c| line.contains(c))
    }

    fn expectation(&self) -> String {
        let mut parts = Vec::new();
        if let Some(e) = &self.equals {
            parts.push(format!("equals {:?}", e));
        }
        if let Some(p) = &self.prefix {
            parts.push(format!("prefix {:?}", p));
        }
        if let Some(c) = &self.contains {
            parts.push(format!("contains {:?}", c));
        }
        if parts.is_empty() {
            "any line".to_string()
        } else {
            parts.join(" and ")
        }
    }
}

impl Operation for ExpectLine {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "expect_line",
            OperationKind::Rule,
            "Match the current line and consume it",
        )
    }

    fn schema(&self) -> Option<ParameterSchema> {
        Some(Self::parameter_schema())
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        match state.reader().current().map(String::from) {
            None => {
                state.record_fail(
                    "expect_line",
                    format!("input exhausted; expected {}", self.expectation()),
                );
            }
            Some(line) => {
                if self.matches(&line) {
                    state.record_pass("expect_line", format!("matched {}", self.expectation()));
                } else {
                    state.record_fail(
                        "expect_line",
                        format!("{:?} does not match {}", line, self.expectation()),
                    );
                }
                state.reader_mut().advance();
            }
        }
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}

// ============================================================================
// SkipBlank
// ============================================================================

/// Advance the line cursor past consecutive blank lines.
#[derive(Debug, Clone)]
pub struct SkipBlank;

impl Operation for SkipBlank {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "skip_blank",
            OperationKind::Rule,
            "Advance past consecutive blank lines",
        )
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        while let Some(line) = state.reader().current() {
            if !line.trim().is_empty() {
                break;
            }
            state.reader_mut().advance();
        }
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}

// ============================================================================
// RepeatRule
// ============================================================================

/// Splice a nested rule block in at the cursor.
///
/// With a `count` the block is physically unrolled that many times; without
/// one it is installed as an unbounded loop, which keeps repeating until a
/// nested rule (typically `until`) stops it.
#[derive(Clone)]
pub struct RepeatRule {
    count: Option<usize>,
    rules: Vec<BoxedOperation>,
}

impl RepeatRule {
    fn parameter_schema() -> ParameterSchema {
        ParameterSchema::new()
            .with(
                "count",
                ParameterSpec::new(ValueType::Integer)
                    .optional()
                    .with_validator(|v| v.as_integer().map_or(false, |i| i >= 0)),
            )
            .with(
                "rules",
                ParameterSpec::new(ValueType::Array).of_elements(ValueType::Map),
            )
    }

    /// Construct from a parameter map, building the nested block through
    /// the registry.
    pub fn from_params(
        registry: &OperationRegistry,
        mut params: ParamMap,
    ) -> Result<Self, SchemaError> {
        validate_params("repeat", &Self::parameter_schema(), &mut params)
            .map_err(|e| invalid("repeat", e))?;

        let count = params
            .get("count")
            .and_then(Value::as_integer)
            .map(|i| i as usize);

        let mut rules = Vec::new();
        if let Some(entries) = params.get("rules").and_then(Value::as_array) {
            for entry in entries {
                rules.push(build_nested(registry, entry)?);
            }
        }
        Ok(Self { count, rules })
    }
}

/// Build one nested rule from its `{ "op": ..., "params": ... }` map.
fn build_nested(
    registry: &OperationRegistry,
    entry: &Value,
) -> Result<BoxedOperation, SchemaError> {
    let map = entry.as_map().ok_or_else(|| SchemaError::MalformedEntry {
        op: "repeat".to_string(),
        field: "rules".to_string(),
        expected: "an object per nested rule".to_string(),
    })?;
    let name = map
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::MalformedEntry {
            op: "repeat".to_string(),
            field: "rules.op".to_string(),
            expected: "a string operation name".to_string(),
        })?;
    let nested_params = map
        .get("params")
        .and_then(Value::as_map)
        .cloned()
        .unwrap_or_default();
    registry.create(name, nested_params)
}

impl std::fmt::Debug for RepeatRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatRule")
            .field("count", &self.count)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Operation for RepeatRule {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "repeat",
            OperationKind::Rule,
            "Splice a nested rule block, unrolled or as an active loop",
        )
    }

    fn schema(&self) -> Option<ParameterSchema> {
        Some(Self::parameter_schema())
    }

    fn apply(&self, _state: &mut CheckState) -> EngineResult<Directive> {
        let repeat = match self.count {
            Some(count) => Repeat::Times(count),
            None => Repeat::Unbounded,
        };
        log::debug!(
            "repeat: splicing {} nested rule(s) with {:?}",
            self.rules.len(),
            repeat
        );
        Ok(Directive::Splice {
            operations: self.rules.clone(),
            repeat,
        })
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}

// ============================================================================
// Until
// ============================================================================

/// Stop an active repeating block when the terminator line is reached.
///
/// Inside an unbounded block this is the rule that makes the loop finite:
/// when the current line equals the terminator (or the input has run out)
/// it signals the sequencer to revert to linear progression. With `consume`
/// set, the terminator line itself is consumed on the way out.
#[derive(Debug, Clone)]
pub struct Until {
    terminator: String,
    consume: bool,
}

impl Until {
    fn parameter_schema() -> ParameterSchema {
        ParameterSchema::new()
            .with("terminator", ParameterSpec::new(ValueType::String))
            .with("consume", ParameterSpec::new(ValueType::Boolean).optional())
    }

    /// Construct from a parameter map, self-checking against the schema.
    pub fn from_params(mut params: ParamMap) -> Result<Self, SchemaError> {
        validate_params("until", &Self::parameter_schema(), &mut params)
            .map_err(|e| invalid("until", e))?;
        Ok(Self {
            terminator: params
                .get("terminator")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            consume: params
                .get("consume")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

impl Operation for Until {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "until",
            OperationKind::Rule,
            "Stop an active repeating block on a terminator line",
        )
    }

    fn schema(&self) -> Option<ParameterSchema> {
        Some(Self::parameter_schema())
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        match state.reader().current().map(String::from) {
            None => {
                log::debug!("until: input exhausted, stopping repetition");
                Ok(Directive::StopRepeating)
            }
            Some(line) if line == self.terminator => {
                state.record_pass("until", format!("terminator {:?} reached", self.terminator));
                if self.consume {
                    state.reader_mut().advance();
                }
                Ok(Directive::StopRepeating)
            }
            Some(_) => Ok(Directive::Continue),
        }
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}

// ============================================================================
// RequestLookup
// ============================================================================

/// Record a lookup key for resolution after the rule pass.
#[derive(Debug, Clone)]
pub struct RequestLookup {
    key: String,
}

impl RequestLookup {
    fn parameter_schema() -> ParameterSchema {
        ParameterSchema::new().with("key", ParameterSpec::new(ValueType::String))
    }

    /// Construct from a parameter map, self-checking against the schema.
    pub fn from_params(mut params: ParamMap) -> Result<Self, SchemaError> {
        validate_params("lookup", &Self::parameter_schema(), &mut params)
            .map_err(|e| invalid("lookup", e))?;
        Ok(Self {
            key: params
                .get("key")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

impl Operation for RequestLookup {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "lookup",
            OperationKind::Rule,
            "Request a lookup to be resolved after the rule pass",
        )
    }

    fn schema(&self) -> Option<ParameterSchema> {
        Some(Self::parameter_schema())
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        log::debug!("lookup: requesting {:?}", self.key);
        state.results_mut().request_lookup(self.key.clone(), "lookup");
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
    use indexmap::indexmap;

    fn state(text: &str) -> CheckState {
        CheckState::new(LineReader::from_text(text))
    }

    #[test]
    fn test_expect_line_matches_and_consumes() {
        let op = ExpectLine::from_params(
            indexmap! {"equals".to_string() => Value::String("BEGIN".to_string())},
        )
        .unwrap();
        let mut st = state("BEGIN\nrest");
        op.apply(&mut st).unwrap();
        assert_eq!(st.results().failure_count(), 0);
        assert_eq!(st.reader().current(), Some("rest"));
    }

    #[test]
    fn test_expect_line_mismatch_still_consumes() {
        let op = ExpectLine::from_params(
            indexmap! {"prefix".to_string() => Value::String("- ".to_string())},
        )
        .unwrap();
        let mut st = state("plain\nnext");
        op.apply(&mut st).unwrap();
        assert_eq!(st.results().failure_count(), 1);
        assert_eq!(st.reader().current(), Some("next"));
    }

    #[test]
    fn test_expect_line_on_exhausted_input() {
        let op = ExpectLine::from_params(ParamMap::new()).unwrap();
        let mut st = state("");
        op.apply(&mut st).unwrap();
        let failures = st.results().failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("exhausted"));
    }

    #[test]
    fn test_expect_line_rejects_wrong_param_type() {
        let err = ExpectLine::from_params(
            indexmap! {"equals".to_string() => Value::Integer(3)},
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidParams { op, .. } if op == "expect_line"));
    }

    #[test]
    fn test_skip_blank_stops_at_content() {
        let mut st = state("\n  \ntext");
        SkipBlank.apply(&mut st).unwrap();
        assert_eq!(st.reader().current(), Some("text"));
    }

    #[test]
    fn test_repeat_unbounded_splices_block() {
        let registry = OperationRegistry::with_builtins();
        let op = RepeatRule::from_params(
            &registry,
            indexmap! {
                "rules".to_string() => Value::Array(vec![Value::Map(indexmap! {
                    "op".to_string() => Value::String("skip_blank".to_string()),
                })]),
            },
        )
        .unwrap();
        let mut st = state("x");
        match op.apply(&mut st).unwrap() {
            Directive::Splice { operations, repeat } => {
                assert_eq!(operations.len(), 1);
                assert_eq!(repeat, Repeat::Unbounded);
            }
            other => panic!("expected Splice, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_with_count_is_finite() {
        let registry = OperationRegistry::with_builtins();
        let op = RepeatRule::from_params(
            &registry,
            indexmap! {
                "count".to_string() => Value::Integer(3),
                "rules".to_string() => Value::Array(vec![Value::Map(indexmap! {
                    "op".to_string() => Value::String("skip_blank".to_string()),
                })]),
            },
        )
        .unwrap();
        let mut st = state("x");
        match op.apply(&mut st).unwrap() {
            Directive::Splice { repeat, .. } => assert_eq!(repeat, Repeat::Times(3)),
            other => panic!("expected Splice, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_rejects_negative_count() {
        let registry = OperationRegistry::with_builtins();
        let err = RepeatRule::from_params(
            &registry,
            indexmap! {
                "count".to_string() => Value::Integer(-1),
                "rules".to_string() => Value::Array(vec![]),
            },
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidParams { .. }));
    }

    #[test]
    fn test_repeat_rejects_nested_entry_without_op() {
        let registry = OperationRegistry::with_builtins();
        let err = RepeatRule::from_params(
            &registry,
            indexmap! {
                "rules".to_string() => Value::Array(vec![Value::Map(indexmap! {
                    "params".to_string() => Value::Map(indexmap! {}),
                })]),
            },
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::MalformedEntry { .. }));
    }

    #[test]
    fn test_until_continues_before_terminator() {
        let op = Until::from_params(
            indexmap! {"terminator".to_string() => Value::String("END".to_string())},
        )
        .unwrap();
        let mut st = state("body\nEND");
        assert!(matches!(op.apply(&mut st).unwrap(), Directive::Continue));
    }

    #[test]
    fn test_until_stops_on_terminator() {
        let op = Until::from_params(
            indexmap! {"terminator".to_string() => Value::String("END".to_string())},
        )
        .unwrap();
        let mut st = state("END");
        assert!(matches!(
            op.apply(&mut st).unwrap(),
            Directive::StopRepeating
        ));
        // Not consumed by default.
        assert_eq!(st.reader().current(), Some("END"));
    }

    #[test]
    fn test_until_consumes_terminator_when_asked() {
        let op = Until::from_params(indexmap! {
            "terminator".to_string() => Value::String("END".to_string()),
            "consume".to_string() => Value::Boolean(true),
        })
        .unwrap();
        let mut st = state("END\nafter");
        op.apply(&mut st).unwrap();
        assert_eq!(st.reader().current(), Some("after"));
    }

    #[test]
    fn test_until_stops_on_exhausted_input() {
        let op = Until::from_params(
            indexmap! {"terminator".to_string() => Value::String("END".to_string())},
        )
        .unwrap();
        let mut st = state("");
        assert!(matches!(
            op.apply(&mut st).unwrap(),
            Directive::StopRepeating
        ));
    }

    #[test]
    fn test_request_lookup_records_key() {
        let op = RequestLookup::from_params(
            indexmap! {"key".to_string() => Value::String("line_ref:2".to_string())},
        )
        .unwrap();
        let mut st = state("a\nb");
        op.apply(&mut st).unwrap();
        assert_eq!(st.results().lookups(), vec!["line_ref:2"]);
    }
}
