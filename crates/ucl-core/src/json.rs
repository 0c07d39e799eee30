//! JSON bridge for the value tree, built on serde.
//!
//! `Value` implements [`serde::Serialize`], so any serde format can emit it;
//! JSON input goes through `serde_json::Value` (with `preserve_order`, so object
//! keys keep their document order).
//!
//! Lossy spots, all in the direction of JSON:
//! - time nodes become plain numbers
//! - userdata and non-UTF-8 strings become arrays of byte values
//! - duplicate object keys are all written; JSON readers usually keep the last

use crate::error::Result;
use crate::types::{Object, Value};
use serde::ser::{Serialize, Serializer};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) | Value::Time(f) => serializer.serialize_f64(*f),
            Value::String(s) => match std::str::from_utf8(s) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => serializer.serialize_bytes(s),
            },
            Value::Userdata(d) => serializer.serialize_bytes(d),
            Value::Object(obj) => obj.serialize(serializer),
            Value::Array(items) => serializer.collect_seq(items),
        }
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl From<serde_json::Value> for Value {
    /// Integers outside the `i64` range become floats.
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(map.into_iter().collect()),
        }
    }
}

impl Value {
    /// Parse a JSON document into a value tree.
    ///
    /// ```
    /// use ucl_core::Value;
    ///
    /// let value = Value::from_json(r#"{"port": 8080}"#).unwrap();
    /// assert_eq!(value.get("port"), Some(&Value::Integer(8080)));
    /// ```
    pub fn from_json(json: &str) -> Result<Value> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        Ok(parsed.into())
    }

    /// Compact JSON rendering.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
