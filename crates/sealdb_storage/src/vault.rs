//! Collection file layout and locked writes.
//!
//! On-disk layout:
//!
//! ```text
//! <root>/
//! ├─ users.sdb            # sealed collection blob
//! ├─ users.json           # plaintext export (export_plaintext)
//! └─ backup/
//!    └─ users.1700000000.bak
//! ```
//!
//! A collection blob has no header, version tag or checksum; the file
//! content is exactly the two-layer ciphertext.

use crate::context::EncryptionContext;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File extension for sealed collection blobs.
pub const COLLECTION_EXT: &str = "sdb";
/// File extension for backup copies.
pub const BACKUP_EXT: &str = "bak";
/// File extension for plaintext exports.
pub const PLAINTEXT_EXT: &str = "json";
/// Default backup subdirectory name.
pub const BACKUP_DIR: &str = "backup";

/// Which kind of file a delete targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A live collection blob.
    Collection,
    /// A backup copy.
    Backup,
}

/// The encrypted byte store for one storage directory.
///
/// A `Vault` pairs a root directory with an [`EncryptionContext`].
/// It reads and writes whole collection blobs; there is no append and
/// no partial update. Concurrent writers are serialized at the OS
/// level by an exclusive advisory lock around the physical write; the
/// read-modify-write cycles of higher layers are **not** isolated
/// from each other.
#[derive(Debug)]
pub struct Vault {
    root: PathBuf,
    context: EncryptionContext,
}

impl Vault {
    /// Creates a vault over the given storage directory.
    ///
    /// The directory itself is created lazily by [`create`](Self::create).
    pub fn new(root: impl Into<PathBuf>, context: EncryptionContext) -> Self {
        Self {
            root: root.into(),
            context,
        }
    }

    /// Returns the storage directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of a collection blob.
    #[must_use]
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{COLLECTION_EXT}"))
    }

    /// Returns the path of a plaintext export.
    #[must_use]
    pub fn plaintext_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{PLAINTEXT_EXT}"))
    }

    /// Returns the path of a backup file inside `folder`.
    ///
    /// `file_name` is the full backup file name including its
    /// extension.
    #[must_use]
    pub fn backup_path(&self, folder: &str, file_name: &str) -> PathBuf {
        self.root.join(folder).join(file_name)
    }

    /// Returns true if the collection's backing file exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.collection_path(name).exists()
    }

    /// Creates the storage directory and an empty backing file for
    /// the collection.
    ///
    /// **Overwrite-on-create**: if the collection already exists its
    /// content is truncated. Callers that must not clobber data check
    /// [`Vault::exists`] first.
    pub fn create(&self, name: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| StorageError::write(&self.root, e))?;
        let path = self.collection_path(name);
        File::create(&path).map_err(|e| StorageError::write(&path, e))?;
        Ok(())
    }

    /// Reads the raw sealed bytes of a collection.
    pub fn read_raw(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.collection_path(name);
        fs::read(&path).map_err(|e| StorageError::read(&path, e))
    }

    /// Reads and opens a collection's plaintext.
    ///
    /// An empty backing file (a collection that was created but never
    /// written) yields empty plaintext rather than a crypto error.
    pub fn read_plaintext(&self, name: &str) -> StorageResult<Vec<u8>> {
        let raw = self.read_raw(name)?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        self.context.open(&raw)
    }

    /// Seals plaintext and replaces the collection file entirely.
    ///
    /// The write happens under an exclusive advisory lock acquired
    /// before the file is truncated; the lock is released on every
    /// exit path when the handle drops.
    pub fn write_plaintext(&self, name: &str, plaintext: &[u8]) -> StorageResult<()> {
        let blob = self.context.seal(plaintext)?;
        self.replace_file(&self.collection_path(name), &blob)
    }

    /// Copies a collection's raw sealed bytes to a backup file.
    ///
    /// The default name is `<collection>.<unix-timestamp>`. Returns
    /// the backup path, or `None` when the collection file is empty
    /// and there is nothing to copy.
    pub fn backup(
        &self,
        name: &str,
        custom_name: Option<&str>,
        folder: &str,
    ) -> StorageResult<Option<PathBuf>> {
        let raw = self.read_raw(name)?;
        if raw.is_empty() {
            return Ok(None);
        }

        let dir = self.root.join(folder);
        fs::create_dir_all(&dir).map_err(|e| StorageError::write(&dir, e))?;

        let stem = match custom_name {
            Some(custom) => custom.to_string(),
            None => format!("{name}.{}", unix_timestamp()),
        };
        let path = dir.join(format!("{stem}.{BACKUP_EXT}"));
        fs::write(&path, &raw).map_err(|e| StorageError::write(&path, e))?;
        Ok(Some(path))
    }

    /// Copies backup bytes back over a live collection file.
    ///
    /// `file_name` is the backup's full file name. When `target` is
    /// `None` the collection name is taken from the file name up to
    /// its first `.`.
    pub fn restore(
        &self,
        file_name: &str,
        folder: &str,
        target: Option<&str>,
    ) -> StorageResult<()> {
        let backup_path = self.backup_path(folder, file_name);
        if !backup_path.exists() {
            return Err(StorageError::not_found(backup_path));
        }

        let target = match target {
            Some(name) => name,
            None => file_name.split('.').next().unwrap_or(file_name),
        };

        let raw = fs::read(&backup_path).map_err(|e| StorageError::read(&backup_path, e))?;
        let live_path = self.collection_path(target);
        fs::write(&live_path, &raw).map_err(|e| StorageError::write(&live_path, e))?;
        Ok(())
    }

    /// Removes a live collection file or a backup file.
    ///
    /// For [`FileKind::Collection`] the name is the collection name;
    /// for [`FileKind::Backup`] it is the backup's full file name
    /// inside `folder`.
    pub fn remove(&self, kind: FileKind, name: &str, folder: &str) -> StorageResult<()> {
        let path = match kind {
            FileKind::Collection => self.collection_path(name),
            FileKind::Backup => self.backup_path(folder, name),
        };
        if !path.exists() {
            return Err(StorageError::not_found(path));
        }
        fs::remove_file(&path).map_err(|e| StorageError::write(&path, e))
    }

    /// Decrypts a collection into a plaintext `.json` sidecar file.
    pub fn export_plaintext(&self, name: &str, dest: &str) -> StorageResult<PathBuf> {
        let plaintext = self.read_plaintext(name)?;
        let path = self.plaintext_path(dest);
        self.replace_file(&path, &plaintext)?;
        Ok(path)
    }

    /// Seals a plaintext `.json` sidecar file into a collection blob.
    pub fn import_plaintext(&self, src: &str, dest: &str) -> StorageResult<PathBuf> {
        let src_path = self.plaintext_path(src);
        let plaintext = fs::read(&src_path).map_err(|e| StorageError::read(&src_path, e))?;
        let blob = self.context.seal(&plaintext)?;
        let path = self.collection_path(dest);
        self.replace_file(&path, &blob)?;
        Ok(path)
    }

    /// Replaces a file's content under an exclusive lock.
    ///
    /// The lock is taken before truncation so a concurrent writer can
    /// never observe or interleave a half-written blob. It is
    /// released when the handle drops, on success and on error alike.
    fn replace_file(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StorageError::write(path, e))?;

        file.lock_exclusive().map_err(|e| StorageError::write(path, e))?;
        let result = Self::overwrite(&file, bytes);
        result.map_err(|e| StorageError::write(path, e))
    }

    fn overwrite(mut file: &File, bytes: &[u8]) -> std::io::Result<()> {
        file.set_len(0)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{CipherKind, IV_SIZE};
    use crate::context::{EncryptionKey, Iv};
    use tempfile::tempdir;

    fn vault(root: &Path) -> Vault {
        let context = EncryptionContext::new(
            CipherKind::Aes256Gcm,
            EncryptionKey::from_bytes(CipherKind::Aes256Gcm, &[1u8; 32]).unwrap(),
            EncryptionKey::from_bytes(CipherKind::Aes256Gcm, &[2u8; 32]).unwrap(),
            Iv::from_bytes(&[3u8; IV_SIZE]).unwrap(),
        )
        .unwrap();
        Vault::new(root, context)
    }

    #[test]
    fn create_makes_directory_and_empty_file() {
        let dir = tempdir().unwrap();
        let vault = vault(&dir.path().join("store"));

        vault.create("users").unwrap();
        assert!(vault.exists("users"));
        assert!(vault.read_raw("users").unwrap().is_empty());
    }

    #[test]
    fn create_truncates_existing_content() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        vault.write_plaintext("users", b"[{\"a\":1}]").unwrap();
        assert!(!vault.read_raw("users").unwrap().is_empty());

        vault.create("users").unwrap();
        assert!(vault.read_raw("users").unwrap().is_empty());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        vault.write_plaintext("users", b"[1,2,3]").unwrap();

        assert_eq!(vault.read_plaintext("users").unwrap(), b"[1,2,3]");
        // On disk the bytes are sealed, not plaintext.
        assert_ne!(vault.read_raw("users").unwrap(), b"[1,2,3]");
    }

    #[test]
    fn missing_collection_is_a_read_error() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        let result = vault.read_plaintext("absent");
        assert!(matches!(result, Err(StorageError::Read { .. })));
    }

    #[test]
    fn empty_backing_file_reads_as_empty_plaintext() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        assert!(vault.read_plaintext("users").unwrap().is_empty());
    }

    #[test]
    fn backup_copies_raw_bytes() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        vault.write_plaintext("users", b"[]").unwrap();

        let path = vault
            .backup("users", Some("snapshot"), BACKUP_DIR)
            .unwrap()
            .unwrap();
        assert_eq!(path, dir.path().join("backup").join("snapshot.bak"));
        assert_eq!(fs::read(&path).unwrap(), vault.read_raw("users").unwrap());
    }

    #[test]
    fn backup_of_empty_collection_is_skipped() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        assert!(vault.backup("users", None, BACKUP_DIR).unwrap().is_none());
    }

    #[test]
    fn restore_overwrites_live_collection() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        vault.write_plaintext("users", b"old").unwrap();
        vault.backup("users", Some("snap"), BACKUP_DIR).unwrap();
        vault.write_plaintext("users", b"new").unwrap();

        vault.restore("snap.bak", BACKUP_DIR, Some("users")).unwrap();
        assert_eq!(vault.read_plaintext("users").unwrap(), b"old");
    }

    #[test]
    fn restore_derives_target_from_file_name() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        vault.write_plaintext("users", b"payload").unwrap();
        let path = vault.backup("users", None, BACKUP_DIR).unwrap().unwrap();
        let file_name = path.file_name().unwrap().to_str().unwrap().to_string();

        vault.remove(FileKind::Collection, "users", BACKUP_DIR).unwrap();
        vault.restore(&file_name, BACKUP_DIR, None).unwrap();
        assert_eq!(vault.read_plaintext("users").unwrap(), b"payload");
    }

    #[test]
    fn restore_of_missing_backup_fails() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        let result = vault.restore("nothing.bak", BACKUP_DIR, None);
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn remove_collection_and_backup() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        vault.write_plaintext("users", b"x").unwrap();
        vault.backup("users", Some("snap"), BACKUP_DIR).unwrap();

        vault.remove(FileKind::Backup, "snap.bak", BACKUP_DIR).unwrap();
        vault.remove(FileKind::Collection, "users", BACKUP_DIR).unwrap();
        assert!(!vault.exists("users"));

        let result = vault.remove(FileKind::Collection, "users", BACKUP_DIR);
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn export_and_import_plaintext() {
        let dir = tempdir().unwrap();
        let vault = vault(dir.path());

        vault.create("users").unwrap();
        vault.write_plaintext("users", b"[{\"n\":1}]").unwrap();

        let exported = vault.export_plaintext("users", "users_dump").unwrap();
        assert_eq!(fs::read(&exported).unwrap(), b"[{\"n\":1}]");

        vault.import_plaintext("users_dump", "users_copy").unwrap();
        assert_eq!(vault.read_plaintext("users_copy").unwrap(), b"[{\"n\":1}]");
    }
}
