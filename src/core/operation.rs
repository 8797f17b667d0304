//! The operation contract every sequenced entity implements.
//!
//! An operation applies itself against a shared [`CheckState`] and returns a
//! [`Directive`] telling the driver how to proceed: keep advancing, splice a
//! new block in at the cursor (possibly activating a loop), or stop an
//! active loop. Operations that declare a [`ParameterSchema`] self-check
//! their constructor parameters before the instance is handed to a
//! sequencer — validation ability is composed in through a free function,
//! not inherited.

use crate::core::error::EngineResult;
use crate::core::state::CheckState;
use crate::schema::params::ParameterSchema;
use crate::sequence::pattern::Repeat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The family an operation belongs to, matching its sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Consumes input lines in order; may introduce repetition.
    Rule,
    /// Checked against every input line independently.
    Validator,
    /// File-level postcondition checked after the rule pass.
    Assertion,
    /// Resolves a lookup key recorded during the rule pass.
    Lookup,
}

impl OperationKind {
    /// Display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            OperationKind::Rule => "Rule",
            OperationKind::Validator => "Validator",
            OperationKind::Assertion => "Assertion",
            OperationKind::Lookup => "Lookup",
        }
    }

    /// All kinds in display order.
    pub fn all() -> &'static [OperationKind] {
        &[
            OperationKind::Rule,
            OperationKind::Validator,
            OperationKind::Assertion,
            OperationKind::Lookup,
        ]
    }
}

/// Identity of an operation: registry name, family, one-line summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationInfo {
    /// Unique registry name (e.g. `expect_line`).
    pub name: String,
    /// The family this operation belongs to.
    pub kind: OperationKind,
    /// One-line description.
    pub summary: String,
}

impl OperationInfo {
    /// Create an info record.
    pub fn new(
        name: impl Into<String>,
        kind: OperationKind,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            summary: summary.into(),
        }
    }
}

/// What the driver should do after applying an operation.
pub enum Directive {
    /// Advance the cursor normally.
    Continue,
    /// Splice `operations` in at the cursor: unrolled for a finite repeat,
    /// installed as an active loop for [`Repeat::Unbounded`].
    Splice {
        operations: Vec<BoxedOperation>,
        repeat: Repeat,
    },
    /// Revert the active loop to linear progression at the cursor.
    StopRepeating,
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Continue => write!(f, "Continue"),
            Directive::Splice { operations, repeat } => f
                .debug_struct("Splice")
                .field("operations", &operations.len())
                .field("repeat", repeat)
                .finish(),
            Directive::StopRepeating => write!(f, "StopRepeating"),
        }
    }
}

/// The core trait for check operations.
///
/// # Design
///
/// Sequencers hold operations as boxed trait objects and the driver invokes
/// [`Operation::apply`] once per cursor position. Implementations report
/// outcomes through the state's result forest rather than by returning
/// errors — an `Err` from `apply` means the run itself cannot proceed, not
/// that the input is invalid.
///
/// `Send + Sync` bounds keep boxed operations shareable; the engine itself
/// runs single-threaded.
pub trait Operation: Send + Sync {
    /// Identity of this operation.
    fn info(&self) -> OperationInfo;

    /// The declared parameter schema, if this operation type has one.
    ///
    /// Returning `None` means construction needs no parameter validation.
    fn schema(&self) -> Option<ParameterSchema> {
        None
    }

    /// Apply this operation against the shared state.
    fn apply(&self, state: &mut CheckState) -> EngineResult<Directive>;

    /// Clone this operation into a boxed trait object.
    ///
    /// Required so a repeating block can hand out fresh copies of its
    /// entities on every splice.
    fn clone_box(&self) -> BoxedOperation;
}

/// A sequenced operation entity.
pub type BoxedOperation = Box<dyn Operation>;

impl Clone for BoxedOperation {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// An operation that records nothing and always continues.
///
/// Useful for driver tests and as a template for new operations.
#[derive(Debug, Clone)]
pub struct NoopOperation;

impl Operation for NoopOperation {
    fn info(&self) -> OperationInfo {
        OperationInfo::new("noop", OperationKind::Rule, "Does nothing")
    }

    fn apply(&self, _state: &mut CheckState) -> EngineResult<Directive> {
        Ok(Directive::Continue)
    }

    fn clone_box(&self) -> BoxedOperation {
        Box::new(self.clone())
    }
}
