//! Update command implementation.

use crate::commands::parse_predicate;
use sealdb_core::{Record, RecordStore};

/// Runs the update command.
pub fn run(
    store: &RecordStore,
    collection: &str,
    r#where: &str,
    set: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let predicate = parse_predicate(Some(r#where))?;
    let patch: Record = serde_json::from_str(set)?;

    let touched = store.update_where(collection, &predicate, &patch)?;
    println!("✓ Updated {touched} record(s) in {collection:?}");
    Ok(())
}
