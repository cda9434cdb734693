//! The `Value` and `Scalar` enums.

use std::fmt;

use indexmap::IndexMap;

use super::{MapValue, SetValue, TimeValue};
use crate::observe::Handle;

/// A dynamic value in an observed object graph.
///
/// `Null` doubles as "absent": reading a missing record key yields `Null`,
/// and a delete reports `Null` as the new value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent / no value.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered list, compared by value and never wrapped.
    List(Vec<Value>),
    /// Plain record. Observing a record (or assigning one into an observed
    /// slot) replaces it with a `Ref` to a freshly registered child.
    Record(IndexMap<String, Value>),
    /// Date-like shared cell, mutated through its setters.
    Time(TimeValue),
    /// Set-like shared cell.
    Set(SetValue),
    /// Map-like shared cell.
    Map(MapValue),
    /// An observed child; the slot-level form of a registered value.
    Ref(Handle),
}

impl Value {
    /// Build a record from key/value pairs, preserving insertion order.
    pub fn record<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The kind tag for this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Record(_) => ValueKind::Record,
            Value::Time(_) => ValueKind::Time,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Ref(_) => ValueKind::Ref,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The handle inside a `Ref`, if this is one.
    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            Value::Ref(h) => Some(*h),
            _ => None,
        }
    }

    /// Numeric view used by the change-equality predicate.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Handle> for Value {
    fn from(h: Handle) -> Self {
        Value::Ref(h)
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Int(n) => Value::Int(n),
            Scalar::Str(s) => Value::Str(s),
        }
    }
}

/// Hashable subset of [`Value`], used for set elements and map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

/// Kind tag for [`Value`], used in diagnostics and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Record,
    Time,
    Set,
    Map,
    Ref,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::List => "list",
            ValueKind::Record => "record",
            ValueKind::Time => "time",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Ref => "ref",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_insertion_order() {
        let value = Value::record([("b", Value::from(1)), ("a", Value::from(2))]);
        let Value::Record(map) = value else {
            panic!("expected record");
        };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn kind_tags_match_variants() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::from(1).kind(), ValueKind::Int);
        assert_eq!(Value::from(1.5).kind(), ValueKind::Float);
        assert_eq!(Value::from("x").kind(), ValueKind::Str);
        assert_eq!(Value::record::<&str, _>([]).kind(), ValueKind::Record);
    }

    #[test]
    fn scalar_converts_to_value() {
        assert_eq!(Value::from(Scalar::Int(3)), Value::Int(3));
        assert_eq!(Value::from(Scalar::from("x")), Value::Str("x".to_string()));
    }
}
