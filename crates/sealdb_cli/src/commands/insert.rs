//! Insert command implementation.

use sealdb_core::{Record, RecordStore, Value};
use std::io::Read;

/// Runs the insert command.
///
/// `record` is inline JSON: a single object inserts one record, an
/// array of objects inserts them all in a single write-back. When
/// omitted, the JSON is read from stdin.
pub fn run(
    store: &RecordStore,
    collection: &str,
    record: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match record {
        Some(inline) => inline.to_string(),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let parsed: Value = serde_json::from_str(&text)?;
    let count = match parsed {
        Value::Object(record) => {
            store.insert(collection, record)?;
            1
        }
        Value::Array(items) => {
            let records: Vec<Record> = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(format!("expected a JSON object, got {other:?}")),
                })
                .collect::<Result<_, _>>()?;
            let count = records.len();
            store.insert_many(collection, records)?;
            count
        }
        other => return Err(format!("expected a JSON object or array, got {other:?}").into()),
    };

    println!("✓ Inserted {count} record(s) into {collection:?}");
    Ok(())
}
