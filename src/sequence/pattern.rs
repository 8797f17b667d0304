//! Advance patterns governing how a sequence cursor moves.
//!
//! A pattern is a tagged variant stored by value inside the sequence and
//! matched explicitly, not a runtime-substitutable strategy object. Exactly
//! one pattern is active at a time; the default is linear progression.

use crate::core::error::{SequenceError, SequenceResult};
use serde::{Deserialize, Serialize};

/// How the cursor index moves forward on each advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AdvancePattern {
    /// Advance by one; signal exhaustion when the list runs out.
    Linear,
    /// Advance by one inside `[start, end)`, wrapping to `start` on reaching
    /// `end`. Never exhausts; termination is an external decision.
    Loop { start: usize, end: usize },
}

/// The repeat-count argument of a splice insertion.
///
/// The unbounded case is a distinct variant rather than a reserved integer,
/// so a finite count of zero stays a legal no-op insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Physically unroll the block this many times.
    Times(usize),
    /// Install the block as an active loop instead of unrolling.
    Unbounded,
}

impl AdvancePattern {
    /// Compute the successor of `index` over a list of `len` entities.
    ///
    /// Linear: errors with [`SequenceError::Exhausted`] once `index` has
    /// already passed the last entity. Loop: wraps to `start` when the
    /// successor reaches or passes `end`; a degenerate `start == end` loop
    /// wraps in place forever without advancing.
    pub fn increment(&self, index: usize, len: usize) -> SequenceResult<usize> {
        match self {
            AdvancePattern::Linear => {
                if index >= len {
                    Err(SequenceError::Exhausted)
                } else {
                    Ok(index + 1)
                }
            }
            AdvancePattern::Loop { start, end } => {
                let next = index + 1;
                Ok(if next >= *end { *start } else { next })
            }
        }
    }

    /// Grow a loop's upper boundary by `offset` entities.
    ///
    /// Called when entities are spliced inside an active loop so the loop
    /// keeps covering the newly inserted block. No-op under Linear.
    pub fn adjust(&mut self, offset: usize) {
        if let AdvancePattern::Loop { end, .. } = self {
            *end += offset;
        }
    }

    /// Whether a loop is currently active.
    pub fn is_loop(&self) -> bool {
        matches!(self, AdvancePattern::Loop { .. })
    }
}

impl Default for AdvancePattern {
    fn default() -> Self {
        AdvancePattern::Linear
    }
}
