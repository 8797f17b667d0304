//! # Veriline - Schema-driven Text Validation
//!
//! Veriline validates a text file against rules expressed in a declarative
//! schema. A JSON schema document names rule, validator, and assertion
//! operations; a sequencing engine executes them against the file's lines.
//!
//! ## Features
//!
//! - **Sequenced Rules**: Rules run in schema order over the input lines,
//!   with repetition expressed as physically unrolled blocks or active
//!   loops spliced in at runtime
//! - **Declarative Parameters**: Every operation's constructor attributes
//!   are checked against a declared parameter schema, with numeric
//!   coercion, container recursion, and custom predicates
//! - **Extensible**: Register custom operations through the
//!   [`OperationRegistry`] and custom lookups through the
//!   [`LookupRegistry`]
//! - **Structured Reports**: Outcomes accumulate in a result forest and
//!   flatten into a serializable [`CheckReport`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use veriline::prelude::*;
//!
//! let schema = r#"{
//!     "rules": [
//!         { "op": "expect_line", "params": { "equals": "BEGIN" } },
//!         { "op": "repeat", "params": { "rules": [
//!             { "op": "until", "params": { "terminator": "END", "consume": true } },
//!             { "op": "expect_line", "params": { "prefix": "- " } }
//!         ] } }
//!     ],
//!     "validators": [
//!         { "op": "max_length", "params": { "limit": 80 } }
//!     ],
//!     "assertions": [
//!         { "op": "line_count", "params": { "min": 2 } }
//!     ]
//! }"#;
//!
//! let runner = CheckRunner::new();
//! let report = runner.check_text(schema, "BEGIN\n- one\n- two\nEND")?;
//! println!("{}", report.summary());
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`core`]: Value types, the operation contract, errors, check state
//! - [`sequence`]: The sequencing engine, advance patterns, typed
//!   sequencers
//! - [`schema`]: Parameter-schema validation and document loading
//! - [`operations`]: Operation registry and built-in operations
//! - [`runner`]: The driver and report types
//! - [`reader`]: Line-by-line input access
//!
//! ## Creating Custom Operations
//!
//! Implement the [`Operation`] trait and register a factory:
//!
//! ```rust,ignore
//! use veriline::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct NonEmptyFile;
//!
//! impl Operation for NonEmptyFile {
//!     fn info(&self) -> OperationInfo {
//!         OperationInfo::new("non_empty_file", OperationKind::Assertion,
//!             "Input must have at least one line")
//!     }
//!
//!     fn apply(&self, state: &mut CheckState) -> Result<Directive, EngineError> {
//!         let passed = !state.reader().is_empty();
//!         state.record_file_level("non_empty_file", passed, "input must not be empty");
//!         Ok(Directive::Continue)
//!     }
//!
//!     fn clone_box(&self) -> BoxedOperation {
//!         Box::new(self.clone())
//!     }
//! }
//!
//! let mut registry = OperationRegistry::with_builtins();
//! registry.register("non_empty_file", OperationKind::Assertion,
//!     "Input must have at least one line", None,
//!     |_, _| Ok(Box::new(NonEmptyFile)));
//! ```
//!
//! [`OperationRegistry`]: crate::operations::registry::OperationRegistry
//! [`LookupRegistry`]: crate::sequence::sequencers::LookupRegistry
//! [`CheckReport`]: crate::runner::report::CheckReport
//! [`Operation`]: crate::core::operation::Operation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod operations;
pub mod reader;
pub mod runner;
pub mod schema;
pub mod sequence;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use veriline::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{ParamMap, Value, ValueType};

    // Operation contract
    pub use crate::core::operation::{
        BoxedOperation, Directive, Operation, OperationInfo, OperationKind,
    };

    // State
    pub use crate::core::state::CheckState;

    // Errors
    pub use crate::core::error::{
        EngineError, EngineResult, ParameterError, RunId, SchemaError, SequenceError,
    };

    // Sequencing
    pub use crate::sequence::pattern::{AdvancePattern, Repeat};
    pub use crate::sequence::sequence::Sequence;
    pub use crate::sequence::sequencers::{
        AssertionSequencer, LookupRegistry, LookupSequencer, RuleSequencer, ValidatorSequencer,
    };

    // Schema
    pub use crate::schema::loader::{OperationEntry, SchemaDocument};
    pub use crate::schema::params::{
        schema_grammar, validate_params, ElementSpec, ParameterSchema, ParameterSpec,
    };

    // Operations
    pub use crate::operations::registry::{OperationFactory, OperationRegistry, RegistryEntry};

    // Built-in operations
    pub use crate::operations::{
        // Rules
        ExpectLine, RepeatRule, RequestLookup, SkipBlank, Until,
        // Validators
        LinePattern, MaxLength, NoTrailingSpace,
        // Assertions
        ContainsLine, LineCount,
        // Lookups
        LineRef, Note,
    };

    // Runner
    pub use crate::runner::driver::{CheckRunner, RunnerOptions};
    pub use crate::runner::report::{CheckRecord, CheckReport, ResultNode, ResultSet};

    // Input
    pub use crate::reader::LineReader;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "veriline");
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = OperationRegistry::with_builtins();

        // Check some built-in operations exist
        assert!(registry.contains("expect_line"));
        assert!(registry.contains("repeat"));
        assert!(registry.contains("until"));
        assert!(registry.contains("max_length"));
        assert!(registry.contains("line_count"));
    }

    #[test]
    fn test_end_to_end_check() {
        let schema = r#"{
            "rules": [
                { "op": "expect_line", "params": { "equals": "BEGIN" } },
                { "op": "repeat", "params": { "rules": [
                    { "op": "until", "params": { "terminator": "END", "consume": true } },
                    { "op": "expect_line", "params": { "prefix": "- " } }
                ] } }
            ],
            "validators": [{ "op": "no_trailing_space" }],
            "assertions": [{ "op": "contains_line", "params": { "text": "END" } }]
        }"#;

        let report = CheckRunner::new()
            .check_text(schema, "BEGIN\n- one\n- two\nEND")
            .unwrap();
        assert!(report.success, "failures: {:?}", report.detailed_failures());
    }

    #[test]
    fn test_end_to_end_failure_report() {
        let schema = r#"{ "rules": [
            { "op": "expect_line", "params": { "equals": "BEGIN" } }
        ] }"#;
        let report = CheckRunner::new().check_text(schema, "nope").unwrap();
        assert!(!report.success);
        assert!(report.summary().contains("failed"));
    }
}
