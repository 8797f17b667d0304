//! Error types for Veriline.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Keep schema-authoring defects and bad input data distinguishable
//! - Include actionable information (which operation, which attribute)
//! - Support error chaining for context

use crate::core::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a single check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Errors raised by the sequencing engine.
///
/// `Exhausted` is ordinary end-of-sequence under the linear pattern and is
/// the driver loop's break condition, not a defect. `OutOfRange` is a
/// contract violation: the cursor points outside the entity list, which
/// cannot happen under correct pattern discipline.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    #[error("sequence exhausted")]
    Exhausted,

    #[error("cursor {index} outside valid positions (len {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Errors raised by parameter-schema validation.
///
/// The two variants must stay distinguishable: `SchemaMalformed` means the
/// operation author's declared schema is itself invalid (a defect in the
/// operation type, unrecoverable), while `ValueInvalid` means the caller
/// supplied data that violates a well-formed schema (ordinary input
/// rejection).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("malformed schema for attribute '{attribute}' on operation '{operation}'\n{grammar}")]
    SchemaMalformed {
        operation: String,
        attribute: String,
        grammar: String,
    },

    #[error("invalid value {value} for attribute '{attribute}'")]
    ValueInvalid { value: Value, attribute: String },
}

/// Errors raised while loading a schema document into operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to parse schema document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("operation '{op}': {source}")]
    InvalidParams {
        op: String,
        #[source]
        source: ParameterError,
    },

    #[error("operation '{op}': expected {expected} in '{field}'")]
    MalformedEntry {
        op: String,
        field: String,
        expected: String,
    },
}

/// Top-level error type for Veriline.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("unknown lookup '{key}' requested by '{requested_by}'")]
    UnknownLookup { key: String, requested_by: String },

    #[error("step limit {limit} exceeded; a repeating block never stopped")]
    StepLimitExceeded { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Veriline operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for sequencing operations.
pub type SequenceResult<T> = Result<T, SequenceError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

impl SequenceError {
    /// Whether this is the ordinary end-of-sequence signal.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, SequenceError::Exhausted)
    }
}

impl ParameterError {
    /// The attribute this error concerns.
    pub fn attribute(&self) -> &str {
        match self {
            ParameterError::SchemaMalformed { attribute, .. }
            | ParameterError::ValueInvalid { attribute, .. } => attribute,
        }
    }

    /// Whether this error indicates a defect in the operation type itself
    /// rather than bad caller input.
    pub fn is_schema_defect(&self) -> bool {
        matches!(self, ParameterError::SchemaMalformed { .. })
    }
}
