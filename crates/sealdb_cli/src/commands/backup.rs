//! Backup and restore commands.
//!
//! Backups copy the sealed bytes as-is, so a backup file is exactly as
//! protected as the live collection and restoring never needs the
//! plaintext.

use sealdb_core::RecordStore;
use tracing::info;

/// Creates a backup of a collection.
pub fn create(
    store: &RecordStore,
    collection: &str,
    name: Option<&str>,
    folder: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(collection, "creating backup");

    match store.backup(collection, name, folder)? {
        Some(path) => {
            println!("✓ Backup created");
            println!("  Path: {path:?}");
        }
        None => {
            println!("Collection {collection:?} is empty, nothing to back up");
        }
    }
    Ok(())
}

/// Restores a collection from a backup file.
pub fn restore(
    store: &RecordStore,
    backup: &str,
    folder: &str,
    target: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(backup, "restoring from backup");

    store.restore(backup, folder, target)?;
    let target = target.unwrap_or_else(|| backup.split('.').next().unwrap_or(backup));
    println!("✓ Restored {backup:?} over collection {target:?}");
    Ok(())
}
