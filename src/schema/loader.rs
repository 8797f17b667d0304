//! Schema document loading.
//!
//! A schema document is a JSON object with up to three sections — `rules`,
//! `validators`, `assertions` — each an ordered list of operation entries:
//!
//! ```json
//! {
//!   "rules": [
//!     { "op": "expect_line", "params": { "equals": "BEGIN" } },
//!     { "op": "repeat", "params": { "rules": [
//!         { "op": "expect_line", "params": { "prefix": "- " } }
//!     ] } }
//!   ],
//!   "validators": [
//!     { "op": "max_length", "params": { "limit": 80 } }
//!   ],
//!   "assertions": [
//!     { "op": "line_count", "params": { "min": 1 } }
//!   ]
//! }
//! ```
//!
//! Loading resolves each entry's `op` name through the
//! [`OperationRegistry`] and returns fully constructed operations, each
//! already self-validated against its declared parameter schema.

use crate::core::error::{EngineResult, SchemaError};
use crate::core::operation::BoxedOperation;
use crate::core::types::{ParamMap, Value};
use crate::operations::registry::OperationRegistry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One operation entry of a schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationEntry {
    /// Registry name of the operation to construct.
    pub op: String,
    /// Constructor parameters, defaulting to none.
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl OperationEntry {
    /// Convert the raw JSON parameters into a [`ParamMap`].
    pub fn param_map(&self) -> ParamMap {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v.clone())))
            .collect()
    }
}

/// A parsed schema document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchemaDocument {
    /// Rule operations, applied in order against the input lines.
    #[serde(default)]
    pub rules: Vec<OperationEntry>,
    /// Validator operations, applied to every line.
    #[serde(default)]
    pub validators: Vec<OperationEntry>,
    /// Assertion operations, applied once after the rule pass.
    #[serde(default)]
    pub assertions: Vec<OperationEntry>,
}

impl SchemaDocument {
    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    /// Serialize back to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Construct the rule operations, in document order.
    pub fn load_rules(&self, registry: &OperationRegistry) -> Result<Vec<BoxedOperation>, SchemaError> {
        load_section(&self.rules, registry)
    }

    /// Construct the validator operations, in document order.
    pub fn load_validators(
        &self,
        registry: &OperationRegistry,
    ) -> Result<Vec<BoxedOperation>, SchemaError> {
        load_section(&self.validators, registry)
    }

    /// Construct the assertion operations, in document order.
    pub fn load_assertions(
        &self,
        registry: &OperationRegistry,
    ) -> Result<Vec<BoxedOperation>, SchemaError> {
        load_section(&self.assertions, registry)
    }
}

fn load_section(
    entries: &[OperationEntry],
    registry: &OperationRegistry,
) -> Result<Vec<BoxedOperation>, SchemaError> {
    entries
        .iter()
        .map(|entry| registry.create(&entry.op, entry.param_map()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_document() {
        let doc = SchemaDocument::from_json(r#"{ "rules": [{ "op": "skip_blank" }] }"#).unwrap();
        assert_eq!(doc.rules.len(), 1);
        assert_eq!(doc.rules[0].op, "skip_blank");
        assert!(doc.validators.is_empty());
        assert!(doc.assertions.is_empty());
    }

    #[test]
    fn test_parse_error_is_schema_error() {
        assert!(matches!(
            SchemaDocument::from_json("not json"),
            Err(SchemaError::Parse(_))
        ));
    }

    #[test]
    fn test_param_map_converts_json_values() {
        let doc = SchemaDocument::from_json(
            r#"{ "validators": [{ "op": "max_length", "params": { "limit": 80 } }] }"#,
        )
        .unwrap();
        let params = doc.validators[0].param_map();
        assert_eq!(params["limit"], Value::Integer(80));
    }

    #[test]
    fn test_load_unknown_operation() {
        let registry = OperationRegistry::with_builtins();
        let doc = SchemaDocument::from_json(r#"{ "rules": [{ "op": "no_such_op" }] }"#).unwrap();
        assert!(matches!(
            doc.load_rules(&registry),
            Err(SchemaError::UnknownOperation(name)) if name == "no_such_op"
        ));
    }

    #[test]
    fn test_load_sections_in_order() {
        let registry = OperationRegistry::with_builtins();
        let doc = SchemaDocument::from_json(
            r#"{
                "rules": [
                    { "op": "expect_line", "params": { "equals": "BEGIN" } },
                    { "op": "skip_blank" }
                ],
                "validators": [{ "op": "no_trailing_space" }],
                "assertions": [{ "op": "line_count", "params": { "min": 1 } }]
            }"#,
        )
        .unwrap();

        let rules = doc.load_rules(&registry).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].info().name, "expect_line");
        assert_eq!(rules[1].info().name, "skip_blank");
        assert_eq!(doc.load_validators(&registry).unwrap().len(), 1);
        assert_eq!(doc.load_assertions(&registry).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_params_propagate() {
        let registry = OperationRegistry::with_builtins();
        // max_length's limit must be a positive integer.
        let doc = SchemaDocument::from_json(
            r#"{ "validators": [{ "op": "max_length", "params": { "limit": 2.5 } }] }"#,
        )
        .unwrap();
        assert!(matches!(
            doc.load_validators(&registry),
            Err(SchemaError::InvalidParams { op, .. }) if op == "max_length"
        ));
    }

    #[test]
    fn test_from_path_round_trip() {
        let doc = SchemaDocument::from_json(r#"{ "rules": [{ "op": "skip_blank" }] }"#).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(doc.to_json().unwrap().as_bytes()).unwrap();
        let loaded = SchemaDocument::from_path(file.path()).unwrap();
        assert_eq!(loaded.rules.len(), 1);
    }
}
