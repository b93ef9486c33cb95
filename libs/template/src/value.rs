//! Value model for expression results
//!
//! Every expression evaluates to a [`Value`]. Objects keep insertion order so that serialized
//! output (status variables, inline javascript) is stable.

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// Ordered string keyed map used for object values
pub type Object = IndexMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Object member by key, `None` for non-objects and missing keys
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Number of elements for arrays and objects, characters for strings
    pub fn len(&self) -> usize {
        match self {
            Value::Array(a) => a.len(),
            Value::Object(o) => o.len(),
            Value::String(s) => s.chars().count(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }

    /// String coercion; null becomes the empty string, containers their JSON form
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => self.to_json(),
        }
    }

    /// Compact JSON serialization
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Membership test: object keys, array elements
    pub fn contains(&self, needle: &Value) -> bool {
        match self {
            Value::Object(o) => o.contains_key(&needle.to_text()),
            Value::Array(a) => a.iter().any(|v| v == needle),
            _ => false,
        }
    }

    /// Member access with the pseudo members `count`, `length` and `empty`.
    /// Anything that does not resolve is null.
    pub fn member(&self, name: &str) -> Value {
        match (self, name) {
            (Value::Null, _) => Value::Null,
            (Value::Array(a), "count" | "length") => Value::Integer(a.len() as i64),
            (_, "empty") => Value::Boolean(self.is_empty()),
            (Value::Object(o), _) => o.get(name).cloned().unwrap_or_default(),
            _ => Value::Null,
        }
    }

    /// Subscript access; out of range or mistyped indices yield null
    pub fn index(&self, index: &Value) -> Value {
        if index.is_null() {
            return Value::Null;
        }
        match self {
            Value::Array(a) => {
                let position = match index {
                    Value::Integer(i) => Some(*i),
                    Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                position
                    .and_then(|p| usize::try_from(p).ok())
                    .and_then(|p| a.get(p))
                    .cloned()
                    .unwrap_or_default()
            }
            Value::Object(o) => o.get(&index.to_text()).cloned().unwrap_or_default(),
            _ => Value::Null,
        }
    }

    /// Ordering across values of the same kind; integers and floats compare numerically
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        let ordering = match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => {
                let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
                x.partial_cmp(&y)
            }
            _ => None,
        };

        ordering.ok_or_else(|| {
            Error::InvalidOperandKind(format!(
                "cannot compare {} with {}",
                self.kind_name(),
                other.kind_name()
            ))
        })
    }

    // ------------------------------------------------------------------
    // Arithmetic

    fn invalid(op: &str, lhs: &Value, rhs: &Value) -> Error {
        Error::InvalidOperandKind(format!(
            "invalid operands for '{}': {} and {}",
            op,
            lhs.kind_name(),
            rhs.kind_name()
        ))
    }

    /// Numeric addition, string concatenation when either side is a string.
    /// A null operand yields the other side.
    pub fn add(&self, rhs: &Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a
                .checked_add(*b)
                .map(Value::Integer)
                .unwrap_or(Value::Float(*a as f64 + *b as f64))),
            (a, b) if a.is_number() && b.is_number() => Ok(Value::Float(
                a.as_f64().unwrap_or_default() + b.as_f64().unwrap_or_default(),
            )),
            (Value::Null, other) | (other, Value::Null) => Ok(other.clone()),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(self.to_text() + &rhs.to_text()))
            }
            _ => Err(Self::invalid("+", self, rhs)),
        }
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a
                .checked_sub(*b)
                .map(Value::Integer)
                .unwrap_or(Value::Float(*a as f64 - *b as f64))),
            (a, b) if a.is_number() && b.is_number() => Ok(Value::Float(
                a.as_f64().unwrap_or_default() - b.as_f64().unwrap_or_default(),
            )),
            _ => Err(Self::invalid("-", self, rhs)),
        }
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a
                .checked_mul(*b)
                .map(Value::Integer)
                .unwrap_or(Value::Float(*a as f64 * *b as f64))),
            (a, b) if a.is_number() && b.is_number() => Ok(Value::Float(
                a.as_f64().unwrap_or_default() * b.as_f64().unwrap_or_default(),
            )),
            _ => Err(Self::invalid("*", self, rhs)),
        }
    }

    /// Integer operands use integer division
    pub fn div(&self, rhs: &Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Integer(_), Value::Integer(0)) => Err(Error::DivisionByZero),
            (Value::Integer(a), Value::Integer(b)) => Ok(a
                .checked_div(*b)
                .map(Value::Integer)
                .unwrap_or(Value::Float(*a as f64 / *b as f64))),
            (a, b) if a.is_number() && b.is_number() => Ok(Value::Float(
                a.as_f64().unwrap_or_default() / b.as_f64().unwrap_or_default(),
            )),
            _ => Err(Self::invalid("/", self, rhs)),
        }
    }

    pub fn rem(&self, rhs: &Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Integer(_), Value::Integer(0)) => Err(Error::DivisionByZero),
            (Value::Integer(a), Value::Integer(b)) => {
                Ok(Value::Integer(a.checked_rem(*b).unwrap_or(0)))
            }
            (a, b) if a.is_number() && b.is_number() => Ok(Value::Float(
                a.as_f64().unwrap_or_default() % b.as_f64().unwrap_or_default(),
            )),
            _ => Err(Self::invalid("%", self, rhs)),
        }
    }

    pub fn neg(&self) -> Result<Value> {
        match self {
            Value::Integer(i) => Ok(i
                .checked_neg()
                .map(Value::Integer)
                .unwrap_or(Value::Float(-(*i as f64)))),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(Error::InvalidOperandKind(format!(
                "can only negate numbers, not {}",
                other.kind_name()
            ))),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for v in a {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Object(o) => {
                let mut map = serializer.serialize_map(Some(o.len()))?;
                for (k, v) in o {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

// ----------------------------------------------------------------------
// Conversions

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Integer(i64::try_from(i).unwrap_or(i64::MAX))
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

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::Array(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => {
                Value::Object(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
