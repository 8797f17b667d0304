//! Core value types that flow through check operations.
//!
//! The type system uses an enum-based approach for several reasons:
//! - Closed set of types: schema parameters have a finite set of data types
//! - Zero-cost pattern matching: Compiler optimizes to jump tables
//! - Serialization: serde handles enums natively
//! - Type safety: Exhaustive matching catches missing cases at compile time

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Core value types that operation parameters can carry.
///
/// This enum represents all possible data types a schema document can supply
/// to an operation constructor. Using an enum provides compile-time type
/// safety and efficient pattern matching.
///
/// Maps preserve insertion order so error reporting stays deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Ordered array of values
    Array(Vec<Value>),
    /// Ordered key-value map
    Map(IndexMap<String, Value>),
    /// Represents absence of value
    None,
}

/// A parameter map as handed to an operation constructor.
pub type ParamMap = IndexMap<String, Value>;

/// Type tags for schema declarations and runtime type checks.
///
/// These are the supported scalar and container types a parameter schema
/// may declare for an attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Float,
    String,
    Boolean,
    Array,
    Map,
}

// ============================================================================
// Value Implementation
// ============================================================================

impl Value {
    /// Get the type tag of this value, or `None` for an absent value.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Float(_) => Some(ValueType::Float),
            Value::String(_) => Some(ValueType::String),
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Array(_) => Some(ValueType::Array),
            Value::Map(_) => Some(ValueType::Map),
            Value::None => None,
        }
    }

    /// Check whether this value is the absent marker.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a float.
    ///
    /// Integers are widened; this is a read accessor, not a coercion.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Try to get this value as an array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        if let Value::Array(items) = self {
            Some(items.as_slice())
        } else {
            None
        }
    }

    /// Try to get this value as a map reference.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        if let Value::Map(map) = self {
            Some(map)
        } else {
            None
        }
    }

    /// Convert a parsed JSON value into a [`Value`].
    ///
    /// JSON numbers become `Integer` when they are whole i64s, `Float`
    /// otherwise. JSON `null` becomes the absent marker.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::None => write!(f, "none"),
        }
    }
}

// ============================================================================
// ValueType Implementation
// ============================================================================

impl ValueType {
    /// Check whether a value's runtime type matches this tag.
    pub fn matches(&self, value: &Value) -> bool {
        value.value_type() == Some(*self)
    }

    /// Whether this tag is one of the numeric types.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }

    /// Whether this tag is one of the container types.
    pub fn is_container(&self) -> bool {
        matches!(self, ValueType::Array | ValueType::Map)
    }

    /// All supported type tags, in grammar order.
    pub fn all() -> &'static [ValueType] {
        &[
            ValueType::Integer,
            ValueType::Float,
            ValueType::String,
            ValueType::Boolean,
            ValueType::Array,
            ValueType::Map,
        ]
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Map => "map",
        };
        write!(f, "{}", name)
    }
}
