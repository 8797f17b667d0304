//! Core types and traits for the Veriline check engine.
//!
//! This module contains the foundational types the engine is built from:
//! - Value types and type tags for operation parameters
//! - The operation contract and driver directives
//! - Error types
//! - The shared check state operations apply against

pub mod error;
pub mod operation;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use error::{EngineError, ParameterError, RunId, SchemaError, SequenceError};
pub use operation::{BoxedOperation, Directive, Operation, OperationInfo, OperationKind};
pub use state::CheckState;
pub use types::{ParamMap, Value, ValueType};
