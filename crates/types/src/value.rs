//! Tagged values held by the settings store

use crate::network::{ImportanceData, ProcessedNetwork};
use std::fmt;
use std::sync::Arc;

/// Kind of a stored value, used to keep a key's type stable across writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Bool,
    Float,
    Text,
    IntList,
    Importance,
    Processed,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::IntList => "int list",
            ValueKind::Importance => "importance data",
            ValueKind::Processed => "processed network",
        };
        f.write_str(name)
    }
}

/// A value in the settings store
///
/// Object references are shared with `Arc` so that the render loop can hold
/// on to loaded network data while the UI replaces the entry.
#[derive(Debug, Clone, Default)]
pub enum SettingValue {
    /// Absent / cleared
    #[default]
    Null,
    Int(i64),
    Bool(bool),
    Float(f64),
    Text(String),
    IntList(Vec<i64>),
    Importance(Arc<ImportanceData>),
    Processed(Arc<ProcessedNetwork>),
}

impl SettingValue {
    /// Kind of this value, `None` for `Null`
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            SettingValue::Null => None,
            SettingValue::Int(_) => Some(ValueKind::Int),
            SettingValue::Bool(_) => Some(ValueKind::Bool),
            SettingValue::Float(_) => Some(ValueKind::Float),
            SettingValue::Text(_) => Some(ValueKind::Text),
            SettingValue::IntList(_) => Some(ValueKind::IntList),
            SettingValue::Importance(_) => Some(ValueKind::Importance),
            SettingValue::Processed(_) => Some(ValueKind::Processed),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SettingValue::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

// Object references compare by identity, everything else by value
impl PartialEq for SettingValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SettingValue::Null, SettingValue::Null) => true,
            (SettingValue::Int(a), SettingValue::Int(b)) => a == b,
            (SettingValue::Bool(a), SettingValue::Bool(b)) => a == b,
            (SettingValue::Float(a), SettingValue::Float(b)) => a == b,
            (SettingValue::Text(a), SettingValue::Text(b)) => a == b,
            (SettingValue::IntList(a), SettingValue::IntList(b)) => a == b,
            (SettingValue::Importance(a), SettingValue::Importance(b)) => Arc::ptr_eq(a, b),
            (SettingValue::Processed(a), SettingValue::Processed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Float(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Text(v)
    }
}

/// Rust types that map onto exactly one [`ValueKind`]
pub trait SettingType: Sized {
    const KIND: ValueKind;

    fn into_value(self) -> SettingValue;

    fn from_value(value: &SettingValue) -> Option<Self>;
}

impl SettingType for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> SettingValue {
        SettingValue::Int(self)
    }

    fn from_value(value: &SettingValue) -> Option<Self> {
        value.as_int()
    }
}

impl SettingType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> SettingValue {
        SettingValue::Bool(self)
    }

    fn from_value(value: &SettingValue) -> Option<Self> {
        value.as_bool()
    }
}

impl SettingType for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> SettingValue {
        SettingValue::Float(self)
    }

    fn from_value(value: &SettingValue) -> Option<Self> {
        value.as_float()
    }
}

impl SettingType for String {
    const KIND: ValueKind = ValueKind::Text;

    fn into_value(self) -> SettingValue {
        SettingValue::Text(self)
    }

    fn from_value(value: &SettingValue) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl SettingType for Vec<i64> {
    const KIND: ValueKind = ValueKind::IntList;

    fn into_value(self) -> SettingValue {
        SettingValue::IntList(self)
    }

    fn from_value(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::IntList(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl SettingType for Arc<ImportanceData> {
    const KIND: ValueKind = ValueKind::Importance;

    fn into_value(self) -> SettingValue {
        SettingValue::Importance(self)
    }

    fn from_value(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Importance(v) => Some(Arc::clone(v)),
            _ => None,
        }
    }
}

impl SettingType for Arc<ProcessedNetwork> {
    const KIND: ValueKind = ValueKind::Processed;

    fn into_value(self) -> SettingValue {
        SettingValue::Processed(self)
    }

    fn from_value(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Processed(v) => Some(Arc::clone(v)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(SettingValue::Int(3).kind(), Some(ValueKind::Int));
        assert_eq!(SettingValue::from("x").kind(), Some(ValueKind::Text));
        assert_eq!(SettingValue::Null.kind(), None);
    }

    #[test]
    fn test_typed_conversion_rejects_other_kinds() {
        let value = SettingValue::Bool(true);
        assert_eq!(bool::from_value(&value), Some(true));
        assert_eq!(i64::from_value(&value), None);
    }

    #[test]
    fn test_object_values_compare_by_identity() {
        let data = Arc::new(ImportanceData::default());
        let a = SettingValue::Importance(Arc::clone(&data));
        let b = SettingValue::Importance(data);
        let c = SettingValue::Importance(Arc::new(ImportanceData::default()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
