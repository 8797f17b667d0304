//! The sequencing engine.
//!
//! An index-based cursor over a mutable, ordered operation list whose
//! advance behavior swaps between linear progression and loop repetition,
//! with runtime splicing at the cursor. Typed sequencers specialize the
//! engine to one population source each.

pub mod pattern;
#[allow(clippy::module_inception)]
pub mod sequence;
pub mod sequencers;

pub use pattern::{AdvancePattern, Repeat};
pub use sequence::Sequence;
pub use sequencers::{
    AssertionSequencer, LookupConstructor, LookupRegistry, LookupSequencer, RuleSequencer,
    ValidatorSequencer,
};
