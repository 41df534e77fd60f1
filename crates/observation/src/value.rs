use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically typed property value carried through change notifications.
///
/// Properties on a subject are heterogeneous, so the registry passes the new
/// and the previous value as a tagged variant rather than a generic parameter.
/// Serializes to plain JSON (untagged).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value, e.g. a property that was never set.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Self>),
    Map(BTreeMap<String, Self>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in log fields.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::List(_) | Self::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            },
        }
    }
}

macro_rules! impl_from_lossless {
    ($variant:ident: $target:ty => $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Self::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

impl_from_lossless!(Bool: bool => bool);
impl_from_lossless!(Int: i64 => i8, i16, i32, i64, u8, u16, u32);
impl_from_lossless!(Float: f64 => f32, f64);
impl_from_lossless!(Text: String => String, &str, char);

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<BTreeMap<String, T>> for Value {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => items.into(),
            serde_json::Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(7_u8), Value::Int(7));
        assert_eq!(Value::from(-3_i32), Value::Int(-3));
        assert_eq!(Value::from(1.5_f64), Value::Float(1.5));
        assert_eq!(Value::from("Alice"), Value::Text("Alice".to_owned()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_owned()));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(2_i64).as_f64(), Some(2.0));
        assert_eq!(Value::from("bob").as_str(), Some("bob"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(false).as_bool(), Some(false));
        assert_eq!(Value::from("1").as_i64(), None);
        assert_eq!(Value::from(vec![1, 2]).type_name(), "list");
    }

    #[test]
    fn test_json_conversion_and_display() {
        let json = serde_json::json!({ "name": "Alice", "age": 30, "tags": ["a", null], "ratio": 0.5 });
        let value = Value::from(json);

        let Value::Map(entries) = &value else { panic!("expected map, got {value:?}") };
        assert_eq!(entries["name"], Value::Text("Alice".to_owned()));
        assert_eq!(entries["age"], Value::Int(30));
        assert_eq!(entries["ratio"], Value::Float(0.5));
        assert_eq!(entries["tags"], Value::List(vec![Value::from("a"), Value::Null]));

        assert_eq!(value.to_string(), r#"{"age":30,"name":"Alice","ratio":0.5,"tags":["a",null]}"#);
        assert_eq!(Value::from("plain").to_string(), "plain");
    }
}
