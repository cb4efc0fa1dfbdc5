//! Insertion-ordered string-keyed map.

use crate::value::Value;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A string-keyed map that preserves insertion order.
///
/// Records and object values use this type. Serialization emits keys
/// in insertion order; [`PartialEq`] ignores order so that two records
/// with the same fields match regardless of how they were built.
///
/// # Example
///
/// ```rust
/// use sealdb_codec::{Map, Value};
///
/// let mut record = Map::new();
/// record.insert("name", Value::from("Lee"));
/// record.insert("age", Value::from(30));
///
/// assert_eq!(record.get("name"), Some(&Value::from("Lee")));
/// assert_eq!(record.keys().collect::<Vec<_>>(), ["name", "age"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an empty map with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by field name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Inserts a field, returning the previous value if the field
    /// already existed.
    ///
    /// An existing field keeps its position; a new field is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        for (k, v) in &mut self.entries {
            if *k == key {
                return Some(std::mem::replace(v, value));
            }
        }
        self.entries.push((key, value));
        None
    }

    /// Removes a field, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Merges every field of `patch` into this map.
    ///
    /// Matching fields are overwritten in place; fields not named by
    /// the patch are left untouched. This is the update-row merge.
    pub fn merge(&mut self, patch: &Map) {
        for (key, value) in patch.iter() {
            self.insert(key, value.clone());
        }
    }

    /// Iterates over `(field, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl PartialEq for Map {
    /// Order-insensitive equality: same field set, equal values.
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Map {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = Map;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Map, A::Error> {
                let mut map = Map::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_position_on_overwrite() {
        let mut map = Map::new();
        map.insert("a", Value::from(1));
        map.insert("b", Value::from(2));

        let old = map.insert("a", Value::from(3));
        assert_eq!(old, Some(Value::from(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(map.get("a"), Some(&Value::from(3)));
    }

    #[test]
    fn equality_ignores_order() {
        let forward: Map = [("a", Value::from(1)), ("b", Value::from(2))]
            .into_iter()
            .collect();
        let backward: Map = [("b", Value::from(2)), ("a", Value::from(1))]
            .into_iter()
            .collect();

        assert_eq!(forward, backward);
    }

    #[test]
    fn equality_checks_values() {
        let left: Map = [("a", Value::from(1))].into_iter().collect();
        let right: Map = [("a", Value::from(2))].into_iter().collect();

        assert_ne!(left, right);
    }

    #[test]
    fn merge_overwrites_named_fields_only() {
        let mut record: Map = [("name", Value::from("a")), ("age", Value::from(5))]
            .into_iter()
            .collect();
        let patch: Map = [("age", Value::from(6))].into_iter().collect();

        record.merge(&patch);

        assert_eq!(record.get("name"), Some(&Value::from("a")));
        assert_eq!(record.get("age"), Some(&Value::from(6)));
    }

    #[test]
    fn remove_returns_value() {
        let mut map: Map = [("a", Value::from(1))].into_iter().collect();
        assert_eq!(map.remove("a"), Some(Value::from(1)));
        assert_eq!(map.remove("a"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn serialization_keeps_insertion_order() {
        let map: Map = [("z", Value::from(1)), ("a", Value::from(2))]
            .into_iter()
            .collect();

        let text = serde_json::to_string(&map).unwrap();
        assert_eq!(text, r#"{"z":1,"a":2}"#);
    }
}
