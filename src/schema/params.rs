//! Declarative parameter schemas and their validation.
//!
//! Each operation type declares a [`ParameterSchema`]: an ordered table
//! mapping attribute names to a [`ParameterSpec`] describing the expected
//! type, an optional nested element/key-value type for containers,
//! optionality, and custom predicate validators. Validation parses each
//! entry into a [`ParameterDefinition`], then checks the live attribute map
//! against it, recursing into container elements.
//!
//! The schema is an explicit value built at construction time — there is no
//! reflection or name-based discovery. Structural schema errors
//! ([`ParameterError::SchemaMalformed`]) stay distinct from data errors
//! ([`ParameterError::ValueInvalid`]): the former is a defect in the
//! operation type, the latter ordinary input rejection.

use crate::core::error::{ParameterError, ParameterResult};
use crate::core::types::{ParamMap, Value, ValueType};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A unary boolean predicate run against a present attribute value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Nested type declaration for a container attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSpec {
    /// Element type of an array attribute.
    Element(ValueType),
    /// Key and value types of a map attribute.
    Entry(ValueType, ValueType),
}

/// Declared expectations for a single constructor attribute.
#[derive(Clone)]
pub struct ParameterSpec {
    expected: ValueType,
    of: Option<ElementSpec>,
    optional: bool,
    validators: Vec<Predicate>,
}

impl ParameterSpec {
    /// Declare a required attribute of the given type.
    pub fn new(expected: ValueType) -> Self {
        Self {
            expected,
            of: None,
            optional: false,
            validators: Vec::new(),
        }
    }

    /// Declare the element type of an array attribute.
    pub fn of_elements(mut self, element: ValueType) -> Self {
        self.of = Some(ElementSpec::Element(element));
        self
    }

    /// Declare the key and value types of a map attribute.
    pub fn of_entries(mut self, key: ValueType, value: ValueType) -> Self {
        self.of = Some(ElementSpec::Entry(key, value));
        self
    }

    /// Mark this attribute as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Append a custom predicate, run in declaration order after all
    /// structural checks.
    pub fn with_validator<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(predicate));
        self
    }

    /// The declared attribute type.
    pub fn expected(&self) -> ValueType {
        self.expected
    }

    /// The declared nested type, if any.
    pub fn of(&self) -> Option<ElementSpec> {
        self.of
    }

    /// Whether the attribute may be absent.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Number of declared custom predicates.
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }
}

impl fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("expected", &self.expected)
            .field("of", &self.of)
            .field("optional", &self.optional)
            .field("validators", &format!("<{}>", self.validators.len()))
            .finish()
    }
}

/// The declared schema of one operation type: attribute name to spec, in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct ParameterSchema {
    entries: IndexMap<String, ParameterSpec>,
}

impl ParameterSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add an attribute declaration.
    pub fn with(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.entries.insert(name.into(), spec);
        self
    }

    /// Look up a declared attribute.
    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.entries.get(name)
    }

    /// Iterate declared attributes in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ParameterSpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the schema declares no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the declared attributes for display (CLI `info` output).
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (name, spec) in self.entries() {
            out.push_str(&format!("  {}: {}", name, spec.expected()));
            match spec.of() {
                Some(ElementSpec::Element(e)) => out.push_str(&format!(" of {}", e)),
                Some(ElementSpec::Entry(k, v)) => {
                    out.push_str(&format!(" of ({}, {})", k, v))
                }
                None => {}
            }
            if spec.is_optional() {
                out.push_str(" (optional)");
            }
            if spec.validator_count() > 0 {
                out.push_str(&format!(" [{} validator(s)]", spec.validator_count()));
            }
            out.push('\n');
        }
        out
    }
}

/// One schema entry parsed against the grammar, ready to check a live value.
///
/// Parsing enforces the structural invariants of the declaration itself;
/// value checks happen afterwards against the attribute map.
pub struct ParameterDefinition<'s> {
    attribute_name: &'s str,
    expected_type: ValueType,
    optional: bool,
    of: Option<ElementSpec>,
    validators: &'s [Predicate],
}

impl fmt::Debug for ParameterDefinition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDefinition")
            .field("attribute_name", &self.attribute_name)
            .field("expected_type", &self.expected_type)
            .field("optional", &self.optional)
            .field("of", &self.of)
            .field("validators", &format!("<{}>", self.validators.len()))
            .finish()
    }
}

/// Render the full valid schema grammar, used in SchemaMalformed
/// diagnostics.
pub fn schema_grammar() -> String {
    let mut types = String::new();
    for (i, t) in ValueType::all().iter().enumerate() {
        if i > 0 {
            types.push_str(" | ");
        }
        types.push_str(&t.to_string());
    }
    format!(
        "parameter schema grammar:\n\
           <attribute>:\n\
             type:       {types}   (required; enforced by construction)\n\
             of:         array -> a single element type\n\
                         map   -> a (key type, value type) pair\n\
                         scalar types must not declare a nested type\n\
             optional:   boolean, default false\n\
             validators: ordered unary boolean predicates, default empty\n"
    )
}

/// Parse one schema entry into a definition.
///
/// Fails with [`ParameterError::SchemaMalformed`] when the nested `of`
/// declaration does not fit the declared type: a nested type on a scalar, a
/// key/value pair on an array, or a single element type on a map.
fn parse_definition<'s>(
    operation: &str,
    name: &'s str,
    spec: &'s ParameterSpec,
) -> ParameterResult<ParameterDefinition<'s>> {
    if let Some(of) = spec.of {
        let fits = matches!(
            (spec.expected, of),
            (ValueType::Array, ElementSpec::Element(_))
                | (ValueType::Map, ElementSpec::Entry(_, _))
        );
        if !fits {
            return Err(ParameterError::SchemaMalformed {
                operation: operation.to_string(),
                attribute: name.to_string(),
                grammar: schema_grammar(),
            });
        }
    }
    Ok(ParameterDefinition {
        attribute_name: name,
        expected_type: spec.expected,
        optional: spec.optional,
        of: spec.of,
        validators: &spec.validators,
    })
}

/// Validate a live parameter map against a declared schema.
///
/// Attributes are processed in declaration order. A malformed schema entry
/// aborts immediately — no further attributes are inspected once the schema
/// itself is known to be invalid. Numeric attributes are coerced to their
/// declared type in place; this is the one mutation validation performs.
pub fn validate_params(
    operation: &str,
    schema: &ParameterSchema,
    params: &mut ParamMap,
) -> ParameterResult<()> {
    for (name, spec) in schema.entries() {
        let definition = parse_definition(operation, name, spec)?;
        validate_attribute(&definition, params)?;
    }
    Ok(())
}

/// Check one attribute: optionality, numeric coercion, type check,
/// container recursion, then custom validators — in that order.
fn validate_attribute(
    definition: &ParameterDefinition<'_>,
    params: &mut ParamMap,
) -> ParameterResult<()> {
    match params.get_mut(definition.attribute_name) {
        None | Some(Value::None) => {
            if definition.optional {
                Ok(())
            } else {
                Err(ParameterError::ValueInvalid {
                    value: Value::None,
                    attribute: definition.attribute_name.to_string(),
                })
            }
        }
        Some(value) => {
            check_value(
                definition.attribute_name,
                definition.expected_type,
                definition.of,
                value,
            )?;
            for predicate in definition.validators {
                if !predicate(value) {
                    return Err(ParameterError::ValueInvalid {
                        value: value.clone(),
                        attribute: definition.attribute_name.to_string(),
                    });
                }
            }
            Ok(())
        }
    }
}

/// Structural checks for a present value: coercion, type match, recursion.
///
/// Shared between the outer attribute and synthetic nested definitions;
/// optionality and custom validators apply only to the outer attribute and
/// are handled by the caller.
fn check_value(
    attribute: &str,
    expected: ValueType,
    of: Option<ElementSpec>,
    value: &mut Value,
) -> ParameterResult<()> {
    if expected.is_numeric() {
        // Numeric expectation: the value must be int- or float-like and
        // coerce without loss. A wrong-typed value reports through this
        // path, before the general type check.
        let coerced = coerce_numeric(value, expected).ok_or_else(|| {
            ParameterError::ValueInvalid {
                value: value.clone(),
                attribute: attribute.to_string(),
            }
        })?;
        *value = coerced;
        return Ok(());
    }

    if !expected.matches(value) {
        return Err(ParameterError::ValueInvalid {
            value: value.clone(),
            attribute: attribute.to_string(),
        });
    }

    match (value, of) {
        (Value::Array(items), Some(ElementSpec::Element(element))) => {
            for item in items.iter_mut() {
                check_nested(attribute, element, item)?;
            }
        }
        (Value::Map(map), Some(ElementSpec::Entry(key_type, value_type))) => {
            for (key, entry) in map.iter_mut() {
                // Keys are text in the value model; they are checked as
                // text values and never mutated.
                let mut key_value = Value::String(key.clone());
                check_nested(attribute, key_type, &mut key_value)?;
                check_nested(attribute, value_type, entry)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Check a container element against a synthetic definition: not optional,
/// no nested type, no custom validators. The element itself is the reported
/// offender on failure.
fn check_nested(attribute: &str, expected: ValueType, value: &mut Value) -> ParameterResult<()> {
    if value.is_none() {
        return Err(ParameterError::ValueInvalid {
            value: Value::None,
            attribute: attribute.to_string(),
        });
    }
    check_value(attribute, expected, None, value)
}

/// Coerce a value to the expected numeric type, requiring the round trip to
/// be lossless. Returns `None` when the value is not numeric or the
/// conversion would change it.
fn coerce_numeric(value: &Value, expected: ValueType) -> Option<Value> {
    match (value, expected) {
        (Value::Integer(i), ValueType::Integer) => Some(Value::Integer(*i)),
        (Value::Float(f), ValueType::Float) => Some(Value::Float(*f)),
        (Value::Float(f), ValueType::Integer) => {
            let truncated = *f as i64;
            if truncated as f64 == *f {
                Some(Value::Integer(truncated))
            } else {
                None
            }
        }
        (Value::Integer(i), ValueType::Float) => {
            let widened = *i as f64;
            if widened as i64 == *i {
                Some(Value::Float(widened))
            } else {
                None
            }
        }
        _ => None,
    }
}
