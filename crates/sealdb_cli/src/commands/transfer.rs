//! Export and import commands.
//!
//! These move plaintext JSON in and out of the vault. The exported
//! sidecar file is NOT encrypted; it exists for inspection and
//! migration, and should be removed once it has served its purpose.

use sealdb_core::RecordStore;

/// Decrypts a collection into a plaintext `.json` file.
pub fn export(
    store: &RecordStore,
    collection: &str,
    dest: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dest = dest.unwrap_or(collection);
    let path = store.export_plaintext(collection, dest)?;
    println!("✓ Exported {collection:?}");
    println!("  Path: {path:?}");
    println!("  WARNING: the exported file is plaintext");
    Ok(())
}

/// Seals a plaintext `.json` file into a collection.
pub fn import(
    store: &RecordStore,
    src: &str,
    dest: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dest = dest.unwrap_or(src);
    let path = store.import_plaintext(src, dest)?;
    println!("✓ Imported into collection {dest:?}");
    println!("  Path: {path:?}");
    Ok(())
}
