//! Declarative schemas: parameter validation and document loading.
//!
//! `params` is the recursive parameter-schema validator operations
//! self-check with at construction; `loader` turns a JSON schema document
//! into constructed operation lists.

pub mod loader;
pub mod params;

pub use loader::{OperationEntry, SchemaDocument};
pub use params::{
    schema_grammar, validate_params, ElementSpec, ParameterSchema, ParameterSpec, Predicate,
};
