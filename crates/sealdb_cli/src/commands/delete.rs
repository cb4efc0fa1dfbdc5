//! Delete command implementation.

use crate::commands::parse_predicate;
use sealdb_core::RecordStore;

/// Runs the delete command.
pub fn run(
    store: &RecordStore,
    collection: &str,
    r#where: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let predicate = parse_predicate(Some(r#where))?;

    let removed = store.delete_where(collection, &predicate)?;
    println!("✓ Removed {removed} record(s) from {collection:?}");
    Ok(())
}
