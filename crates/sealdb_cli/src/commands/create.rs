//! Create command implementation.

use sealdb_core::RecordStore;

/// Runs the create command.
///
/// Refuses to clobber an existing collection unless `force` is set;
/// creation truncates the backing file.
pub fn run(
    store: &RecordStore,
    collection: &str,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if store.vault().exists(collection) && !force {
        return Err(format!(
            "Collection {collection:?} already exists (use --force to overwrite)"
        )
        .into());
    }

    store.create_collection(collection)?;
    println!("✓ Created collection {collection:?}");
    println!("  Path: {:?}", store.vault().collection_path(collection));
    Ok(())
}
