//! Built-in validator operations: MaxLength, NoTrailingSpace, LinePattern
//!
//! Validators are applied to every input line independently; the driver
//! seeks the reader to each line and traverses the validator sequencer
//! linearly. They record failures only — a clean line produces no record.

use crate::core::error::{EngineResult, SchemaError};
use crate::core::operation::{BoxedOperation, Directive, Operation, OperationInfo, OperationKind};
use crate::core::state::CheckState;
use crate::core::types::{ParamMap, Value, ValueType};
use crate::operations::registry::OperationRegistry;
use crate::schema::params::{validate_params, ParameterSchema, ParameterSpec};

/// Register validator operations.
pub fn register(registry: &mut OperationRegistry) {
    registry.register(
        "max_length",
        OperationKind::Validator,
        "Line length must not exceed a limit",
        Some(MaxLength::parameter_schema()),
        |_, params| MaxLength::from_params(params).map(|op| Box::new(op) as BoxedOperation),
    );
    registry.register(
        "no_trailing_space",
        OperationKind::Validator,
        "Lines must not end in whitespace",
        None,
        |_, _| Ok(Box::new(NoTrailingSpace) as BoxedOperation),
    );
    registry.register(
        "pattern",
        OperationKind::Validator,
        "Guarded lines must contain a required fragment",
        Some(LinePattern::parameter_schema()),
        |_, params| LinePattern::from_params(params).map(|op| Box::new(op) as BoxedOperation),
    );
}

fn invalid(op: &str, source: crate::core::error::ParameterError) -> SchemaError {
    SchemaError::InvalidParams {
        op: op.to_string(),
        source,
    }
}

// ============================================================================
// MaxLength
// ============================================================================

/// Fail lines longer than `limit` characters.
#[derive(Debug, Clone)]
pub struct MaxLength {
    limit: usize,
}

impl MaxLength {
    fn parameter_schema() -> ParameterSchema {
        ParameterSchema::new().with(
            "limit",
            ParameterSpec::new(ValueType::Integer)
                .with_validator(|v| v.as_integer().map_or(false, |i| i > 0)),
        )
    }

    /// Construct from a parameter map, self-checking against the schema.
    pub fn from_params(mut params: ParamMap) -> Result<Self, SchemaError> {
        validate_params("max_length", &Self::parameter_schema(), &mut params)
            .map_err(|e| invalid("max_length", e))?;
        Ok(Self {
            limit: params
                .get("limit")
                .and_then(Value::as_integer)
                .unwrap_or_default() as usize,
        })
    }
}

impl Operation for MaxLength {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "max_length",
            OperationKind::Validator,
            "Line length must not exceed a limit",
        )
    }

    fn schema(&self) -> Option<ParameterSchema> {
        Some(Self::parameter_schema())
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        if let Some(line) = state.reader().current().map(String::from) {
            let length = line.chars().count();
            if length > self.limit {
                state.record_fail(
                    "max_length",
                    format!("{} characters exceeds limit {}", length, self.limit),
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
// NoTrailingSpace
// ============================================================================

/// Fail lines that end in whitespace.
#[derive(Debug, Clone)]
pub struct NoTrailingSpace;

impl Operation for NoTrailingSpace {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "no_trailing_space",
            OperationKind::Validator,
            "Lines must not end in whitespace",
        )
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        if let Some(line) = state.reader().current().map(String::from) {
            if line != line.trim_end() {
                state.record_fail("no_trailing_space", "line ends in whitespace");
            }
        }
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}

// ============================================================================
// LinePattern
// ============================================================================

/// Require a fragment on lines selected by an optional prefix guard.
///
/// Without a guard every line must contain the fragment; with one, only
/// lines starting with the guard are checked.
#[derive(Debug, Clone)]
pub struct LinePattern {
    contains: String,
    when_prefix: Option<String>,
}

impl LinePattern {
    fn parameter_schema() -> ParameterSchema {
        ParameterSchema::new()
            .with("contains", ParameterSpec::new(ValueType::String))
            .with(
                "when_prefix",
                ParameterSpec::new(ValueType::String).optional(),
            )
    }

    /// Construct from a parameter map, self-checking against the schema.
    pub fn from_params(mut params: ParamMap) -> Result<Self, SchemaError> {
        validate_params("pattern", &Self::parameter_schema(), &mut params)
            .map_err(|e| invalid("pattern", e))?;
        Ok(Self {
            contains: params
                .get("contains")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            when_prefix: params
                .get("when_prefix")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }
}

impl Operation for LinePattern {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "pattern",
            OperationKind::Validator,
            "Guarded lines must contain a required fragment",
        )
    }

    fn schema(&self) -> Option<ParameterSchema> {
        Some(Self::parameter_schema())
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        if let Some(line) = state.reader().current().map(String::from) {
            let guarded = self
                .when_prefix
                .as_deref()
                .map_or(true, |p| line.starts_with(p));
            if guarded && !line.contains(&self.contains) {
                state.record_fail(
                    "pattern",
                    format!("line does not contain {:?}", self.contains),
                );
            }
        }
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}
