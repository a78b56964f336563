// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dynamic values crossing the attribute pipeline.
//!
//! A device answers with loosely typed data and the pipeline stages turn it
//! into something meaningful (a number, a flag set, a quantity). [`Value`] is
//! the common currency between those stages, the host cache and the transport
//! collaborator.

mod args;
mod quantity;

pub use args::CallArgs;
pub use quantity::Quantity;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Quantity(Quantity),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Quantity(_) => "quantity",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Integer view of the value.
    ///
    /// Floats are accepted when they carry no fractional part and strings are
    /// parsed after trimming.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(f) => integral(*f),
            Value::Str(s) => {
                let t = s.trim();
                t.parse::<i64>()
                    .ok()
                    .or_else(|| t.parse::<f64>().ok().and_then(integral))
            }
            _ => None,
        }
    }

    /// Floating point view of the value. Quantities yield their magnitude.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Quantity(q) => Some(q.magnitude),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Boolean interpretation of a device answer.
    pub fn to_flag(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(true),
                "0" | "false" | "off" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Truthiness used by checks.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Quantity(q) => q.magnitude != 0.0,
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
        }
    }

    /// Equality tolerant to the int/float distinction.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => self == other,
        }
    }
}

/// Integer held by a float, `None` when fractional or outside the `i64` range.
fn integral(f: f64) -> Option<i64> {
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && (-BOUND..BOUND).contains(&f)).then(|| f as i64)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Quantity(q) => write!(f, "{}", q),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
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

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u8> for Value {
    fn from(i: u8) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Quantity> for Value {
    fn from(q: Quantity) -> Self {
        Value::Quantity(q)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

/// Identifier of a channel inside its pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Index(i64),
    Name(String),
}

impl ChannelId {
    pub fn to_value(&self) -> Value {
        match self {
            ChannelId::Index(i) => Value::Int(*i),
            ChannelId::Name(n) => Value::Str(n.clone()),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Index(i) => write!(f, "{}", i),
            ChannelId::Name(n) => f.write_str(n),
        }
    }
}

impl From<i64> for ChannelId {
    fn from(i: i64) -> Self {
        ChannelId::Index(i)
    }
}

impl From<i32> for ChannelId {
    fn from(i: i32) -> Self {
        ChannelId::Index(i64::from(i))
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        ChannelId::Name(s.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        ChannelId::Name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::from("  42 ").as_i64(), Some(42));
        assert_eq!(Value::from("4.0").as_i64(), Some(4));
        assert_eq!(Value::from("4.5").as_i64(), None);
        assert_eq!(Value::Float(2.0).as_i64(), Some(2));
        assert_eq!(Value::Float(-1e300).as_i64(), None);
        assert_eq!(Value::Float(f64::INFINITY).as_i64(), None);
        assert_eq!(Value::Float(9.3e18).as_i64(), None);
        assert_eq!(Value::from("1e300").as_i64(), None);
        assert_eq!(Value::from("1e3").as_f64(), Some(1000.0));
        assert_eq!(Value::Str("abc".into()).as_f64(), None);
    }

    #[test]
    fn test_flags() {
        let cases = vec![
            (Value::from("ON"), Some(true)),
            (Value::from("0"), Some(false)),
            (Value::Int(3), Some(true)),
            (Value::from("maybe"), None),
        ];
        for (value, expected) in cases {
            assert_eq!(value.to_flag(), expected, "flag of {}", value);
        }
    }

    #[test]
    fn test_untagged_deserialization() {
        let json = r#"[null, true, 3, 2.5, "txt", {"magnitude": 1.0, "unit": "V"}, {"a": 1}]"#;
        let parsed: Vec<Value> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[0], Value::None);
        assert_eq!(parsed[1], Value::Bool(true));
        assert_eq!(parsed[2], Value::Int(3));
        assert_eq!(parsed[3], Value::Float(2.5));
        assert_eq!(parsed[4], Value::from("txt"));
        assert_eq!(parsed[5], Value::Quantity(Quantity::new(1.0, "V")));
        assert!(parsed[6].as_map().is_some());
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Int(2).loosely_equals(&Value::Float(2.0)));
        assert!(!Value::Int(2).loosely_equals(&Value::from("2")));
    }
}
