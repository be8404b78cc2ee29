//! Normalization of decoded values into plain values
//!
//! Authentication tokens are handed to the handler as `PlainValue` trees so
//! that authentication code never depends on decoder types such as
//! [`ValueMap`]. The traversal is a single recursive pass:
//!
//! - map → map, every key kept, every value normalized
//! - list → list, order kept
//! - scalar, temporal and spatial values → unchanged
//!
//! Recursion depth is bounded by the decoder's nesting limit.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::{Point, Temporal, Value, ValueMap};

/// Authentication token: the normalized `auth_token` field of INIT.
pub type AuthToken = BTreeMap<String, PlainValue>;

/// Decoder-independent value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlainValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<PlainValue>),
    Map(BTreeMap<String, PlainValue>),
    Temporal(Temporal),
    Point(Point),
}

impl PlainValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlainValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PlainValue {
    fn from(v: &str) -> Self {
        PlainValue::String(v.to_string())
    }
}

impl From<i64> for PlainValue {
    fn from(v: i64) -> Self {
        PlainValue::Integer(v)
    }
}

/// Convert a decoded value into its plain equivalent.
pub fn normalize(value: &Value) -> PlainValue {
    match value {
        Value::Null => PlainValue::Null,
        Value::Boolean(b) => PlainValue::Boolean(*b),
        Value::Integer(i) => PlainValue::Integer(*i),
        Value::Float(f) => PlainValue::Float(*f),
        Value::Bytes(b) => PlainValue::Bytes(b.clone()),
        Value::String(s) => PlainValue::String(s.clone()),
        Value::List(items) => PlainValue::List(items.iter().map(normalize).collect()),
        Value::Map(map) => PlainValue::Map(normalize_map(map)),
        Value::Temporal(t) => PlainValue::Temporal(t.clone()),
        Value::Point(p) => PlainValue::Point(p.clone()),
    }
}

/// Normalize every value of a map, keeping its keys.
pub fn normalize_map(map: &ValueMap) -> AuthToken {
    map.iter()
        .map(|(k, v)| (k.to_string(), normalize(v)))
        .collect()
}
