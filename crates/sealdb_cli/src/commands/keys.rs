//! Keys command implementation.

use sealdb_core::RecordStore;

/// Runs the keys command, printing the inferred key skeleton.
pub fn run(store: &RecordStore, collection: &str) -> Result<(), Box<dyn std::error::Error>> {
    let skeleton = store.schema_keys(collection)?;
    println!("{}", serde_json::to_string_pretty(&skeleton)?);
    Ok(())
}
