//! Verify command implementation.

use sealdb_core::RecordStore;

/// Runs the verify command.
///
/// A collection passes when its backing file is empty, or when the
/// sealed bytes still decrypt and decode to a non-empty record
/// sequence.
pub fn run(store: &RecordStore, collection: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying collection {collection:?}");

    if store.integrity_check(collection)? {
        println!("✓ Collection verification passed");
        Ok(())
    } else {
        println!("✗ Collection verification failed");
        Err("Verification failed".into())
    }
}
