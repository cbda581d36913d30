//! Conversion between [`Value`] and `serde_json::Value`.

use serde_json::Value as JsonValue;

use crate::value::{Map, Value};

/// Convert a parsed `serde_json` tree into a [`Value`].
///
/// Numbers follow the i64 / u64 / f64 ladder: values representable as i64
/// become integers, larger positive values become unsigned, everything else
/// becomes a float.
pub fn from_json(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::I64(i)
            } else if let Some(u) = n.as_u64() {
                Value::U64(u)
            } else if let Some(f) = n.as_f64() {
                Value::F64(f)
            } else {
                Value::Invalid
            }
        }
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(items) => Value::Array(items.iter().map(from_json).collect()),
        JsonValue::Object(obj) => {
            let mut map = Map::with_capacity(obj.len());
            for (key, val) in obj {
                map.insert(key.clone(), from_json(val));
            }
            Value::Object(map)
        }
    }
}

/// Convert back to a `serde_json` tree.
///
/// `Invalid` and non-finite floats have no JSON rendering and map to null.
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null | Value::Invalid => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::I64(i) => JsonValue::Number((*i).into()),
        Value::U64(u) => JsonValue::Number((*u).into()),
        Value::F64(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Array(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Value::Object(map) => {
            let mut obj = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                obj.insert(key.clone(), to_json(val));
            }
            JsonValue::Object(obj)
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        from_json(json)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        from_json(&json)
    }
}

impl From<&Value> for JsonValue {
    fn from(value: &Value) -> Self {
        to_json(value)
    }
}
