//! Property values
//!
//! Property values stored on nodes, relationships and the graph itself.
//! Setting or removing a property returns the previous [`Property`], which is
//! either a [`DefinedProperty`] or [`Property::NoProperty`] for the key.
//!
//! ## Equality Rules
//!
//! - Different types are NEVER equal (no type coercion)
//! - `Int(1)` != `Float(1.0)`
//! - Float uses IEEE-754 equality: `NaN != NaN`
//!
//! Uniqueness constraints compare values with these rules.

use crate::types::PropertyKeyId;
use serde::{Deserialize, Serialize};

/// A property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean true or false
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit IEEE-754 floating point
    Float(f64),

    /// UTF-8 encoded string
    String(String),

    /// Arbitrary binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the type name as a string (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
        }
    }

    /// Try to get as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// A property key bound to a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinedProperty {
    /// Property key
    pub key: PropertyKeyId,
    /// Property value
    pub value: Value,
}

impl DefinedProperty {
    /// Create a defined property
    pub fn new(key: PropertyKeyId, value: impl Into<Value>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// The state of a property key on an entity
///
/// Returned by property set/remove operations to report the value that was
/// there before the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    /// The key had a value
    Defined(DefinedProperty),
    /// The key had no value
    NoProperty(PropertyKeyId),
}

impl Property {
    /// Property key this state refers to
    pub fn key(&self) -> PropertyKeyId {
        match self {
            Property::Defined(p) => p.key,
            Property::NoProperty(key) => *key,
        }
    }

    /// Value, if the property was defined
    pub fn value(&self) -> Option<&Value> {
        match self {
            Property::Defined(p) => Some(&p.value),
            Property::NoProperty(_) => None,
        }
    }

    /// Check if the property was defined
    pub fn is_defined(&self) -> bool {
        matches!(self, Property::Defined(_))
    }

    /// Build a property state from an optional previous value
    pub fn from_previous(key: PropertyKeyId, previous: Option<Value>) -> Self {
        match previous {
            Some(value) => Property::Defined(DefinedProperty { key, value }),
            None => Property::NoProperty(key),
        }
    }
}
