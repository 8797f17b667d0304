//! Typed sequencers: thin specializations of [`Sequence`] over boxed
//! operations, one per population source.
//!
//! Each sequencer consults its source exactly once at construction — there
//! is no lazy re-fetching. Behavior is identical across all of them; the
//! driver works against the underlying [`Sequence`] directly through
//! `sequence()`/`sequence_mut()`.

use crate::core::error::{EngineError, EngineResult};
use crate::core::operation::BoxedOperation;
use crate::operations::registry::OperationRegistry;
use crate::runner::report::ResultSet;
use crate::schema::loader::SchemaDocument;
use crate::sequence::sequence::Sequence;
use indexmap::IndexMap;
use std::sync::Arc;

/// Sequencer over the schema's rule operations.
pub struct RuleSequencer {
    seq: Sequence<BoxedOperation>,
}

impl RuleSequencer {
    /// Build from the schema document's rule section.
    pub fn from_schema(
        schema: &SchemaDocument,
        registry: &OperationRegistry,
    ) -> EngineResult<Self> {
        Ok(Self {
            seq: Sequence::new(schema.load_rules(registry)?),
        })
    }

    /// The underlying sequence.
    pub fn sequence(&self) -> &Sequence<BoxedOperation> {
        &self.seq
    }

    /// Mutable access to the underlying sequence.
    pub fn sequence_mut(&mut self) -> &mut Sequence<BoxedOperation> {
        &mut self.seq
    }
}

/// Sequencer over the schema's validator operations.
pub struct ValidatorSequencer {
    seq: Sequence<BoxedOperation>,
}

impl ValidatorSequencer {
    /// Build from the schema document's validator section.
    pub fn from_schema(
        schema: &SchemaDocument,
        registry: &OperationRegistry,
    ) -> EngineResult<Self> {
        Ok(Self {
            seq: Sequence::new(schema.load_validators(registry)?),
        })
    }

    /// The underlying sequence.
    pub fn sequence(&self) -> &Sequence<BoxedOperation> {
        &self.seq
    }

    /// Mutable access to the underlying sequence.
    pub fn sequence_mut(&mut self) -> &mut Sequence<BoxedOperation> {
        &mut self.seq
    }
}

/// Sequencer over the schema's assertion operations.
pub struct AssertionSequencer {
    seq: Sequence<BoxedOperation>,
}

impl AssertionSequencer {
    /// Build from the schema document's assertion section.
    pub fn from_schema(
        schema: &SchemaDocument,
        registry: &OperationRegistry,
    ) -> EngineResult<Self> {
        Ok(Self {
            seq: Sequence::new(schema.load_assertions(registry)?),
        })
    }

    /// The underlying sequence.
    pub fn sequence(&self) -> &Sequence<BoxedOperation> {
        &self.seq
    }

    /// Mutable access to the underlying sequence.
    pub fn sequence_mut(&mut self) -> &mut Sequence<BoxedOperation> {
        &mut self.seq
    }
}

// ============================================================================
// Lookup registry and sequencer
// ============================================================================

/// Constructor for a lookup operation.
///
/// Invoked with the full lookup-key text, the result set the key was
/// recorded in, and the name of the operation that requested it.
pub type LookupConstructor =
    Arc<dyn Fn(&str, &ResultSet, &str) -> EngineResult<BoxedOperation> + Send + Sync>;

/// An explicit table of lookup constructors, keyed by the name part of the
/// lookup key (the text before the first `:`).
///
/// The table is injected into the lookup sequencer's constructor rather
/// than living in process-wide state, keeping construction deterministic
/// and testable.
pub struct LookupRegistry {
    entries: IndexMap<String, LookupConstructor>,
}

impl LookupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in lookups.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::operations::lookups::register(&mut registry);
        registry
    }

    /// Register a lookup constructor under a name.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&str, &ResultSet, &str) -> EngineResult<BoxedOperation> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(constructor));
    }

    /// Look up a constructor by name.
    pub fn get(&self, name: &str) -> Option<&LookupConstructor> {
        self.entries.get(name)
    }

    /// Check if a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LookupRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Sequencer over the operations instantiated for recorded lookup keys.
pub struct LookupSequencer {
    seq: Sequence<BoxedOperation>,
}

impl LookupSequencer {
    /// Build one operation per recorded lookup request, in request order.
    ///
    /// The key's name part selects the constructor; the constructor
    /// receives the full key, the result set, and the requesting
    /// operation's name. An unregistered name is a construction error.
    pub fn from_results(results: &ResultSet, registry: &LookupRegistry) -> EngineResult<Self> {
        let mut operations = Vec::new();
        for request in results.lookup_requests() {
            let name = request.key.split(':').next().unwrap_or(&request.key);
            let constructor =
                registry
                    .get(name)
                    .ok_or_else(|| EngineError::UnknownLookup {
                        key: request.key.clone(),
                        requested_by: request.requested_by.clone(),
                    })?;
            operations.push(constructor(&request.key, results, &request.requested_by)?);
        }
        Ok(Self {
            seq: Sequence::new(operations),
        })
    }

    /// The underlying sequence.
    pub fn sequence(&self) -> &Sequence<BoxedOperation> {
        &self.seq
    }

    /// Mutable access to the underlying sequence.
    pub fn sequence_mut(&mut self) -> &mut Sequence<BoxedOperation> {
        &mut self.seq
    }
}
