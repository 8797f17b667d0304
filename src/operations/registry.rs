//! Operation registry for managing available operation types.

use crate::core::error::SchemaError;
use crate::core::operation::{BoxedOperation, OperationKind};
use crate::core::types::ParamMap;
use crate::schema::params::ParameterSchema;
use indexmap::IndexMap;
use std::sync::Arc;

/// Factory function for creating operation instances from a parameter map.
///
/// Factories receive the registry so composite operations (the repeat rule)
/// can construct their nested block through it.
pub type OperationFactory =
    Arc<dyn Fn(&OperationRegistry, ParamMap) -> Result<BoxedOperation, SchemaError> + Send + Sync>;

/// Registry entry containing the factory and cached description.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Factory function to create instances.
    pub factory: OperationFactory,
    /// Which sequencer family the operation belongs to.
    pub kind: OperationKind,
    /// One-line description.
    pub summary: String,
    /// The declared parameter schema, cached so `info` output does not need
    /// an instance.
    pub schema: Option<ParameterSchema>,
}

/// Registry for all available operation types.
///
/// The registry maintains a collection of operation factories keyed by
/// name. The schema loader resolves each document entry's `op` name through
/// it; unknown names and parameter failures surface as [`SchemaError`]s.
pub struct OperationRegistry {
    /// Operations indexed by their unique name.
    operations: IndexMap<String, RegistryEntry>,
    /// Operation names grouped by kind.
    kinds: IndexMap<OperationKind, Vec<String>>,
}

impl OperationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            operations: IndexMap::new(),
            kinds: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in operations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::operations::register_all(&mut registry);
        registry
    }

    /// Register an operation type.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        kind: OperationKind,
        summary: impl Into<String>,
        schema: Option<ParameterSchema>,
        factory: F,
    ) where
        F: Fn(&OperationRegistry, ParamMap) -> Result<BoxedOperation, SchemaError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let entry = RegistryEntry {
            factory: Arc::new(factory),
            kind,
            summary: summary.into(),
            schema,
        };
        self.operations.insert(name.clone(), entry);
        self.kinds.entry(kind).or_insert_with(Vec::new).push(name);
    }

    /// Create a new instance of an operation by name.
    pub fn create(&self, name: &str, params: ParamMap) -> Result<BoxedOperation, SchemaError> {
        let entry = self
            .operations
            .get(name)
            .ok_or_else(|| SchemaError::UnknownOperation(name.to_string()))?;
        (entry.factory)(self, params)
    }

    /// Get a registry entry.
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.operations.get(name)
    }

    /// Check if an operation is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Get all registered operation names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(|s| s.as_str())
    }

    /// Get all registered entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.operations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get operation names of one kind.
    pub fn by_kind(&self, kind: OperationKind) -> Vec<&str> {
        self.kinds
            .get(&kind)
            .map(|names| names.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Get the total number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
