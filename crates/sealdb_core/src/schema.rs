//! Schema introspection.
//!
//! Collections carry no declared schema; the key skeleton is inferred
//! from the records themselves. The skeleton is the union over all
//! records: a field present in any record appears, nested objects and
//! arrays keep their shape, and every leaf position is `null`.

use sealdb_codec::{Map, Record, Value};

/// Infers the key skeleton of `records`.
///
/// Arrays contribute their elements under stringified index keys.
/// When the same path holds an object in one record and a scalar in
/// another, the object shape wins.
#[must_use]
pub fn schema_keys(records: &[Record]) -> Map {
    let mut skeleton = Map::new();
    for record in records {
        merge_object(&mut skeleton, record);
    }
    skeleton
}

fn merge_object(skeleton: &mut Map, object: &Map) {
    for (key, value) in object.iter() {
        merge_value(skeleton, key, value);
    }
}

fn merge_value(skeleton: &mut Map, key: &str, value: &Value) {
    match value {
        Value::Object(nested) => {
            let mut inner = match skeleton.get(key) {
                Some(Value::Object(existing)) => existing.clone(),
                _ => Map::new(),
            };
            merge_object(&mut inner, nested);
            skeleton.insert(key.to_string(), Value::Object(inner));
        }
        Value::Array(items) => {
            let mut inner = match skeleton.get(key) {
                Some(Value::Object(existing)) => existing.clone(),
                _ => Map::new(),
            };
            for (index, item) in items.iter().enumerate() {
                merge_value(&mut inner, &index.to_string(), item);
            }
            skeleton.insert(key.to_string(), Value::Object(inner));
        }
        _ => {
            // A scalar never displaces an already-merged object shape.
            if !matches!(skeleton.get(key), Some(Value::Object(_))) {
                skeleton.insert(key.to_string(), Value::Null);
            }
        }
    }
}
