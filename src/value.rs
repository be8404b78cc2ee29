//! Decoded PackStream values
//!
//! `Value` is the decoder's representation of a request argument. Maps keep
//! their wire order but are key-unique, and compare without regard to order.
//! Temporal and spatial values (Bolt v2) are carried as the plain field data
//! sent on the wire.

use std::collections::HashMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::status::ExternalError;

/// Temporal value, as sent by Bolt v2 clients.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type")]
pub enum Temporal {
    Date { epoch_day: i64 },
    Time { nano_of_day: i64, offset_seconds: i64 },
    LocalTime { nano_of_day: i64 },
    DateTime { epoch_second: i64, nano: i64, offset_seconds: i64 },
    DateTimeZoneId { epoch_second: i64, nano: i64, zone_id: String },
    LocalDateTime { epoch_second: i64, nano: i64 },
    Duration { months: i64, days: i64, seconds: i64, nanos: i64 },
}

/// Spatial point; `z` is set for 3D points.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Point {
    pub srid: i64,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
    Temporal(Temporal),
    Point(Point),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(v)
    }
}

impl From<Temporal> for Value {
    fn from(v: Temporal) -> Self {
        Value::Temporal(v)
    }
}

/// String-keyed map with unique keys.
///
/// Entries keep wire order; `index` maps each key to its position so lookups
/// and inserts stay constant time on large maps.
#[derive(Clone, Default)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace an entry, returning the previous value for the key.
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[i].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Value); N]> for ValueMap {
    fn from(entries: [(K, Value); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Contents of a map-typed message field.
///
/// The decoder yields `Error` instead of the map when it met a value it had
/// to reject while reading the map. The map's bytes are still fully consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum MapSlot {
    Map(ValueMap),
    Error(ExternalError),
}

impl MapSlot {
    /// The embedded error, if this slot carries one.
    pub fn embedded_error(&self) -> Option<&ExternalError> {
        match self {
            MapSlot::Error(err) => Some(err),
            MapSlot::Map(_) => None,
        }
    }

    pub fn into_map(self) -> std::result::Result<ValueMap, ExternalError> {
        match self {
            MapSlot::Map(map) => Ok(map),
            MapSlot::Error(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[test]
    fn test_map_equality_ignores_order() {
        let a = ValueMap::from([("x", Value::Integer(1)), ("y", Value::from("two"))]);
        let b = ValueMap::from([("y", Value::from("two")), ("x", Value::Integer(1))]);
        assert_eq!(a, b);

        let c = ValueMap::from([("x", Value::Integer(1))]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_map_insert_replaces() {
        let mut map = ValueMap::new();
        assert_eq!(map.insert("k", Value::Integer(1)), None);
        assert_eq!(map.insert("k", Value::Integer(2)), Some(Value::Integer(1)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("k"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_map_keeps_wire_order() {
        let mut map = ValueMap::from([("b", Value::Null), ("a", Value::Null), ("c", Value::Null)]);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);

        map.insert("a", Value::Integer(1));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(format!("{:?}", map), r#"{"b": Null, "a": Integer(1), "c": Null}"#);
    }

    #[test]
    fn test_large_map_lookup() {
        let map: ValueMap = (0..200_000i64).map(|i| (format!("k{}", i), Value::Integer(i))).collect();
        assert_eq!(map.len(), 200_000);
        assert_eq!(map.get("k0"), Some(&Value::Integer(0)));
        assert_eq!(map.get("k199999"), Some(&Value::Integer(199_999)));
        assert!(!map.contains_key("k200000"));
        let reversed: ValueMap = map.clone().into_iter().rev().collect();
        assert_eq!(map, reversed);
    }

    #[test]
    fn test_value_accessors() {
        let value = Value::from(ValueMap::from([("name", Value::from("neo"))]));
        let map = value.as_map().unwrap();
        assert_eq!(map.get("name").and_then(Value::as_str), Some("neo"));
        assert_eq!(value.as_str(), None);
        assert_eq!(Value::Integer(1).as_map(), None);
    }

    #[test]
    fn test_value_serializes_as_plain_json() {
        let value = Value::from(ValueMap::from([
            ("name", Value::from("neo")),
            ("tags", Value::List(vec![Value::Integer(1), Value::Boolean(true), Value::Null])),
        ]));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({"name": "neo", "tags": [1, true, null]}));
    }

    #[test]
    fn test_temporal_serializes_with_type_tag() {
        let value = Value::Temporal(Temporal::Date { epoch_day: 17_000 });
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Date", "epoch_day": 17_000}));
    }

    #[test]
    fn test_map_slot_embedded_error() {
        let err = ExternalError::new(Status::StatementTypeError, "nope");
        let slot = MapSlot::Error(err.clone());
        assert_eq!(slot.embedded_error(), Some(&err));
        assert_eq!(slot.into_map(), Err(err));

        let slot = MapSlot::Map(ValueMap::new());
        assert!(slot.embedded_error().is_none());
        assert_eq!(slot.into_map(), Ok(ValueMap::new()));
    }
}
