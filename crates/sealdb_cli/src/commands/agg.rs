//! Aggregate command implementation.

use sealdb_core::{AggregateOp, RecordStore};

/// Runs the agg command.
pub fn run(
    store: &RecordStore,
    collection: &str,
    field: &str,
    op: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let op: AggregateOp = op.parse()?;
    let result = store.aggregate_field(collection, field, op)?;
    println!("{op}({field}) = {result}");
    Ok(())
}
