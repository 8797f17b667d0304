//! Operation module.
//!
//! Contains the operation registry and the built-in operation
//! implementations, one submodule per family.

pub mod assertions;
pub mod lookups;
pub mod registry;
pub mod rules;
pub mod validators;

use crate::operations::registry::OperationRegistry;

/// Register all built-in schema-loadable operations.
pub fn register_all(registry: &mut OperationRegistry) {
    rules::register(registry);
    validators::register(registry);
    assertions::register(registry);
}

// Re-export for direct access
pub use assertions::{ContainsLine, LineCount};
pub use lookups::{LineRef, Note};
pub use registry::{OperationFactory, RegistryEntry};
pub use rules::{ExpectLine, RepeatRule, RequestLookup, SkipBlank, Until};
pub use validators::{LinePattern, MaxLength, NoTrailingSpace};
