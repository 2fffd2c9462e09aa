//! Structured key/value fields attached to records.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// A single structured field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: Cow<'static, str>,
    pub value: Value,
}

/// Field payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(Cow<'static, str>),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Duration(Duration),
    Error(String),
    Json(serde_json::Value),
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Field {
    Field::new(key, Value::String(value.into()))
}

pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Field {
    Field::new(key, Value::I64(value))
}

pub fn uint(key: impl Into<Cow<'static, str>>, value: u64) -> Field {
    Field::new(key, Value::U64(value))
}

pub fn float(key: impl Into<Cow<'static, str>>, value: f64) -> Field {
    Field::new(key, Value::F64(value))
}

pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Field {
    Field::new(key, Value::Bool(value))
}

pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Field {
    Field::new(key, Value::Duration(value))
}

/// An error rendered through its `Display` impl under the key `error`.
pub fn error(err: &(dyn std::error::Error + 'static)) -> Field {
    Field::new("error", Value::Error(err.to_string()))
}

/// Any serializable value. Serialization failures are recorded as the error text.
pub fn any<T: Serialize + ?Sized>(key: impl Into<Cow<'static, str>>, value: &T) -> Field {
    let value = serde_json::to_value(value)
        .unwrap_or_else(|e| serde_json::Value::String(format!("<unserializable: {e}>")));
    Field::new(key, Value::Json(value))
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            // seconds, as a float
            Value::Duration(d) => serializer.serialize_f64(d.as_secs_f64()),
            Value::Error(e) => serializer.serialize_str(e),
            Value::Json(v) => v.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Duration(d) => write!(f, "{d:?}"),
            Value::Error(e) => f.write_str(e),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}
