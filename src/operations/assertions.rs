//! Built-in assertion operations: LineCount, ContainsLine
//!
//! Assertions are file-level postconditions, traversed once after the rule
//! pass. They look at the whole line list rather than the cursor and record
//! an outcome either way.

use crate::core::error::{EngineResult, SchemaError};
use crate::core::operation::{BoxedOperation, Directive, Operation, OperationInfo, OperationKind};
use crate::core::state::CheckState;
use crate::core::types::{ParamMap, Value, ValueType};
use crate::operations::registry::OperationRegistry;
use crate::schema::params::{validate_params, ParameterSchema, ParameterSpec};

/// Register assertion operations.
pub fn register(registry: &mut OperationRegistry) {
    registry.register(
        "line_count",
        OperationKind::Assertion,
        "Total line count must fall within bounds",
        Some(LineCount::parameter_schema()),
        |_, params| LineCount::from_params(params).map(|op| Box::new(op) as BoxedOperation),
    );
    registry.register(
        "contains_line",
        OperationKind::Assertion,
        "Some line must equal the given text",
        Some(ContainsLine::parameter_schema()),
        |_, params| ContainsLine::from_params(params).map(|op| Box::new(op) as BoxedOperation),
    );
}

fn invalid(op: &str, source: crate::core::error::ParameterError) -> SchemaError {
    SchemaError::InvalidParams {
        op: op.to_string(),
        source,
    }
}

// ============================================================================
// LineCount
// ============================================================================

/// Assert the input's total line count lies within `[min, max]`.
///
/// Either bound may be omitted.
#[derive(Debug, Clone)]
pub struct LineCount {
    min: Option<usize>,
    max: Option<usize>,
}

impl LineCount {
    fn parameter_schema() -> ParameterSchema {
        let non_negative =
            |v: &Value| v.as_integer().map_or(false, |i| i >= 0);
        ParameterSchema::new()
            .with(
                "min",
                ParameterSpec::new(ValueType::Integer)
                    .optional()
                    .with_validator(non_negative),
            )
            .with(
                "max",
                ParameterSpec::new(ValueType::Integer)
                    .optional()
                    .with_validator(non_negative),
            )
    }

    /// Construct from a parameter map, self-checking against the schema.
    pub fn from_params(mut params: ParamMap) -> Result<Self, SchemaError> {
        validate_params("line_count", &Self::parameter_schema(), &mut params)
            .map_err(|e| invalid("line_count", e))?;
        Ok(Self {
            min: params.get("min").and_then(Value::as_integer).map(|i| i as usize),
            max: params.get("max").and_then(Value::as_integer).map(|i| i as usize),
        })
    }
}

impl Operation for LineCount {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "line_count",
            OperationKind::Assertion,
            "Total line count must fall within bounds",
        )
    }

    fn schema(&self) -> Option<ParameterSchema> {
        Some(Self::parameter_schema())
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        let count = state.reader().len();
        let above_min = self.min.map_or(true, |min| count >= min);
        let below_max = self.max.map_or(true, |max| count <= max);
        let passed = above_min && below_max;
        let bounds = match (self.min, self.max) {
            (Some(min), Some(max)) => format!("[{}, {}]", min, max),
            (Some(min), None) => format!("at least {}", min),
            (None, Some(max)) => format!("at most {}", max),
            (None, None) => "any".to_string(),
        };
        state.record_file_level(
            "line_count",
            passed,
            format!("{} line(s), expected {}", count, bounds),
        );
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}

// ============================================================================
// ContainsLine
// ============================================================================

/// Assert that some line equals the given text exactly.
#[derive(Debug, Clone)]
pub struct ContainsLine {
    text: String,
}

impl ContainsLine {
    fn parameter_schema() -> ParameterSchema {
        ParameterSchema::new().with("text", ParameterSpec::new(ValueType::String))
    }

    /// Construct from a parameter map, self-checking against the schema.
    pub fn from_params(mut params: ParamMap) -> Result<Self, SchemaError> {
        validate_params("contains_line", &Self::parameter_schema(), &mut params)
            .map_err(|e| invalid("contains_line", e))?;
        Ok(Self {
            text: params
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

impl Operation for ContainsLine {
    fn info(&self) -> OperationInfo {
        OperationInfo::new(
            "contains_line",
            OperationKind::Assertion,
            "Some line must equal the given text",
        )
    }

    fn schema(&self) -> Option<ParameterSchema> {
        Some(Self::parameter_schema())
    }

    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive> {
        let found = state.reader().lines().iter().any(|line| line == &self.text);
        state.record_file_level(
            "contains_line",
            found,
            if found {
                format!("found line {:?}", self.text)
            } else {
                format!("no line equals {:?}", self.text)
            },
        );
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}
