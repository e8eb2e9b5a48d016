use bytes::Bytes;
use serde_json::{Map, Number};

/// Wire tags of the tagged value encoding.
pub mod tag {
    pub const UNDEFINED: u8 = 0;
    pub const STRING: u8 = 1;
    /// A bare byte array.
    pub const RAW: u8 = 2;
    /// A byte array wrapped in a buffer object.
    pub const BUFFER: u8 = 3;
    pub const ARRAY: u8 = 4;
    /// Any other object, carried as JSON text.
    pub const OBJECT: u8 = 5;
    pub const INT: u8 = 6;
}

/// A decoded self-describing value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    String(String),
    /// Bare bytes (renders as an index-keyed object).
    Raw(Bytes),
    /// Bytes wrapped in a buffer object (renders as `{"buffer": {...}}`).
    Buffer(Bytes),
    Array(Vec<Value>),
    Object(serde_json::Value),
    Int(u32),
}

impl Value {
    /// The wire tag for this value.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Undefined => tag::UNDEFINED,
            Self::String(_) => tag::STRING,
            Self::Raw(_) => tag::RAW,
            Self::Buffer(_) => tag::BUFFER,
            Self::Array(_) => tag::ARRAY,
            Self::Object(_) => tag::OBJECT,
            Self::Int(_) => tag::INT,
        }
    }

    /// Returns true when the value is absent or has no fields.
    ///
    /// Absent covers `Undefined` and falsy scalars (`0`, `""`, JSON `null`,
    /// `false`). Empty covers objects without fields and zero-length raw
    /// bytes. Empty arrays are *not* empty: they render as `[]`, not `{}`.
    pub fn is_structurally_empty(&self) -> bool {
        match self {
            Self::Undefined => true,
            Self::Int(n) => *n == 0,
            Self::String(s) => s.is_empty(),
            Self::Raw(bytes) => bytes.is_empty(),
            Self::Buffer(_) | Self::Array(_) => false,
            Self::Object(json) => match json {
                serde_json::Value::Null => true,
                serde_json::Value::Bool(b) => !b,
                serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
                serde_json::Value::String(s) => s.is_empty(),
                serde_json::Value::Object(map) => map.is_empty(),
                serde_json::Value::Array(_) => false,
            },
        }
    }

    /// Element `index` of an array value.
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<u32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render as JSON. `Undefined` becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Undefined => serde_json::Value::Null,
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Raw(bytes) => bytes_to_json(bytes),
            Self::Buffer(bytes) => buffer_to_json(bytes),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(json) => json.clone(),
            Self::Int(n) => serde_json::Value::Number(Number::from(*n)),
        }
    }
}

/// Render bytes as an index-keyed object: `{"0":b0,"1":b1,...}`.
pub fn bytes_to_json(bytes: &[u8]) -> serde_json::Value {
    let map: Map<String, serde_json::Value> = bytes
        .iter()
        .enumerate()
        .map(|(i, b)| (i.to_string(), serde_json::Value::Number(Number::from(*b))))
        .collect();
    serde_json::Value::Object(map)
}

/// Render bytes as a wrapped buffer object: `{"buffer":{"0":b0,...}}`.
pub fn buffer_to_json(bytes: &[u8]) -> serde_json::Value {
    let mut map = Map::with_capacity(1);
    map.insert("buffer".to_string(), bytes_to_json(bytes));
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_object_is_empty() {
        assert!(Value::Object(json!({})).is_structurally_empty());
        assert!(!Value::Object(json!({"a": 1})).is_structurally_empty());
    }

    #[test]
    fn falsy_scalars_are_absent() {
        assert!(Value::Undefined.is_structurally_empty());
        assert!(Value::Int(0).is_structurally_empty());
        assert!(Value::String(String::new()).is_structurally_empty());
        assert!(Value::Object(json!(null)).is_structurally_empty());
        assert!(Value::Object(json!(false)).is_structurally_empty());
    }

    #[test]
    fn arrays_and_buffers_are_never_empty() {
        assert!(!Value::Array(Vec::new()).is_structurally_empty());
        assert!(!Value::Buffer(Bytes::new()).is_structurally_empty());
        assert!(!Value::Array(vec![Value::Int(100)]).is_structurally_empty());
    }

    #[test]
    fn raw_bytes_render_in_index_order() {
        let bytes: Vec<u8> = (0..12).collect();
        let text = serde_json::to_string(&bytes_to_json(&bytes)).unwrap();
        assert!(text.starts_with(r#"{"0":0,"1":1,"2":2,"#));
        assert!(text.ends_with(r#""10":10,"11":11}"#));
    }

    #[test]
    fn buffer_renders_wrapped() {
        let value = Value::Buffer(Bytes::from_static(&[7, 8]));
        assert_eq!(value.to_json(), json!({"buffer": {"0": 7, "1": 8}}));
    }

    #[test]
    fn undefined_in_array_renders_null() {
        let value = Value::Array(vec![Value::Int(1), Value::Undefined, Value::String("x".into())]);
        assert_eq!(value.to_json(), json!([1, null, "x"]));
    }

    #[test]
    fn get_and_accessors() {
        let value = Value::Array(vec![Value::Int(100), Value::String("ch".into())]);
        assert_eq!(value.get(0).and_then(Value::as_int), Some(100));
        assert_eq!(value.get(1).and_then(Value::as_str), Some("ch"));
        assert!(value.get(2).is_none());
        assert!(Value::Int(3).get(0).is_none());
    }
}
