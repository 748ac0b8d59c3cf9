//! FILENAME: engine/src/value.rs
//! PURPOSE: Defines the scalar values a record item can hold.
//! CONTEXT: This file contains the `Value` enum shared by fields, records
//! and tables. Values are plain data: cloneable, comparable and serialized
//! as bare JSON scalars.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single item value inside a field or record.
///
/// Serialized untagged, so a record looks like an ordinary JSON object:
/// `{"username": "Bella", "attempts": 3, "active": true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Returns the inner text if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner number if this is a `Number` value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the inner boolean if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The name of this value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_integral_number() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-3.0).to_string(), "-3");
    }

    #[test]
    fn test_display_other_variants() {
        assert_eq!(Value::Text("abc".to_string()).to_string(), "abc");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(Value::from("pass"), Value::Text("pass".to_string()));
        assert_eq!(Value::from(7), Value::Number(7.0));
        assert_eq!(Value::from(false), Value::Bool(false));
    }

    #[test]
    fn test_serde_untagged() {
        let value: Value = serde_json::from_str("\"login\"").unwrap();
        assert_eq!(value, Value::Text("login".to_string()));

        let value: Value = serde_json::from_str("3").unwrap();
        assert_eq!(value, Value::Number(3.0));

        let value: Value = serde_json::from_str("null").unwrap();
        assert!(value.is_null());

        assert_eq!(serde_json::to_string(&Value::Bool(true)).unwrap(), "true");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Text("a".to_string()).as_str(), Some("a"));
        assert_eq!(Value::Number(1.5).as_number(), Some(1.5));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Null.as_str(), None);
        assert_eq!(Value::Text("a".to_string()).type_name(), "text");
    }
}
