//! Rm command implementation.

use sealdb_core::{FileKind, RecordStore};

/// Runs the rm command.
///
/// Removes a live collection file, or a backup file inside `folder`
/// when `backup` is set.
pub fn run(
    store: &RecordStore,
    name: &str,
    backup: bool,
    folder: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind = if backup {
        FileKind::Backup
    } else {
        FileKind::Collection
    };

    store.delete(kind, name, folder)?;
    println!("✓ Removed {name:?}");
    Ok(())
}
