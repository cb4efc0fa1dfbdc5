//! The record store: CRUD and maintenance over an encrypted vault.

use crate::aggregate::{aggregate, AggregateOp};
use crate::condition::{evaluate, numeric_value, Predicate};
use crate::error::CoreResult;
use crate::schema;
use sealdb_codec::{decode_records, encode_records, CodecError, Map, Record};
use sealdb_storage::{FileKind, Vault};
use std::path::PathBuf;

/// Ordering of returned record sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectOrder {
    /// Stored order, oldest insert first.
    #[default]
    Stored,
    /// Reversed stored order, newest insert first.
    Reversed,
}

/// A collection-oriented record store over an encrypted [`Vault`].
///
/// Every operation addresses a collection by name and performs a full
/// read-modify-write cycle: the whole collection is decrypted, decoded,
/// transformed in memory and written back. There is no cache and no
/// cross-call record identity.
///
/// Writes take an exclusive file lock, so two processes cannot
/// interleave a single write. Read-modify-write cycles are NOT atomic
/// across the read and the write; concurrent mutators can still lose
/// updates to each other.
#[derive(Debug)]
pub struct RecordStore {
    vault: Vault,
}

impl RecordStore {
    /// Creates a store over `vault`.
    #[must_use]
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }

    /// Accesses the underlying vault.
    #[must_use]
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Creates an empty collection.
    ///
    /// An existing collection of the same name is truncated; callers
    /// that must not clobber data check [`Vault::exists`] first.
    ///
    /// # Errors
    ///
    /// Fails when the storage directory or backing file cannot be
    /// created.
    pub fn create_collection(&self, name: &str) -> CoreResult<()> {
        self.vault.create(name)?;
        Ok(())
    }

    fn load(&self, name: &str) -> CoreResult<Vec<Record>> {
        let plaintext = self.vault.read_plaintext(name)?;
        let text = String::from_utf8(plaintext)
            .map_err(|_| CodecError::invalid_shape("collection plaintext is not UTF-8"))?;
        Ok(decode_records(&text)?)
    }

    fn save(&self, name: &str, records: &[Record]) -> CoreResult<()> {
        let text = encode_records(records)?;
        self.vault.write_plaintext(name, text.as_bytes())?;
        Ok(())
    }

    /// Returns the whole collection in stored order.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read, decrypted or decoded.
    pub fn records(&self, name: &str) -> CoreResult<Vec<Record>> {
        self.load(name)
    }

    /// Returns the whole collection in the requested order.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read, decrypted or decoded.
    pub fn records_ordered(&self, name: &str, order: SelectOrder) -> CoreResult<Vec<Record>> {
        let mut records = self.load(name)?;
        if order == SelectOrder::Reversed {
            records.reverse();
        }
        Ok(records)
    }

    /// Appends one record to the collection.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read or written back.
    pub fn insert(&self, name: &str, record: Record) -> CoreResult<()> {
        let mut records = self.load(name)?;
        records.push(record);
        self.save(name, &records)
    }

    /// Appends several records in a single write-back.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read or written back.
    pub fn insert_many(
        &self,
        name: &str,
        new_records: impl IntoIterator<Item = Record>,
    ) -> CoreResult<()> {
        let mut records = self.load(name)?;
        records.extend(new_records);
        self.save(name, &records)
    }

    /// Returns the records matching `predicate`, in the requested
    /// order.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read, decrypted or decoded.
    pub fn select_where(
        &self,
        name: &str,
        predicate: &Predicate,
        order: SelectOrder,
    ) -> CoreResult<Vec<Record>> {
        let records = self.load(name)?;
        let mut matches: Vec<Record> = records
            .into_iter()
            .filter(|record| evaluate(record, predicate))
            .collect();
        if matches.is_empty() {
            tracing::debug!(collection = name, "select matched no records");
        }
        if order == SelectOrder::Reversed {
            matches.reverse();
        }
        Ok(matches)
    }

    /// Merges `patch` into every record matching `predicate`.
    ///
    /// Patch keys overwrite matching keys in place; other fields are
    /// kept. Returns the number of records touched.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read or written back.
    pub fn update_where(
        &self,
        name: &str,
        predicate: &Predicate,
        patch: &Record,
    ) -> CoreResult<usize> {
        let mut records = self.load(name)?;
        let mut touched = 0;
        for record in &mut records {
            if evaluate(record, predicate) {
                record.merge(patch);
                touched += 1;
            }
        }
        self.save(name, &records)?;
        tracing::debug!(collection = name, touched, "update applied");
        Ok(touched)
    }

    /// Removes every record matching `predicate`, keeping the rest in
    /// stored order. Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read or written back.
    pub fn delete_where(&self, name: &str, predicate: &Predicate) -> CoreResult<usize> {
        let records = self.load(name)?;
        let before = records.len();
        let kept: Vec<Record> = records
            .into_iter()
            .filter(|record| !evaluate(record, predicate))
            .collect();
        let removed = before - kept.len();
        self.save(name, &kept)?;
        tracing::debug!(collection = name, removed, "delete applied");
        Ok(removed)
    }

    /// Infers the collection's key skeleton across all records.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read, decrypted or decoded.
    pub fn schema_keys(&self, name: &str) -> CoreResult<Map> {
        let records = self.load(name)?;
        Ok(schema::schema_keys(&records))
    }

    /// Reduces the numeric values of `field` across the collection.
    ///
    /// Records where the field is absent or not coercible to a number
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read, or with
    /// [`crate::CoreError::EmptyInput`] when no record contributes a
    /// value (except `COUNT`, which yields `0`).
    pub fn aggregate_field(
        &self,
        name: &str,
        field: &str,
        op: AggregateOp,
    ) -> CoreResult<f64> {
        let records = self.load(name)?;
        let values: Vec<f64> = records
            .iter()
            .filter_map(|record| record.get(field).and_then(numeric_value))
            .collect();
        aggregate(&values, op)
    }

    /// Checks that a non-empty backing file still decodes to records.
    ///
    /// Returns `true` for an empty backing file (a freshly created
    /// collection), and `false` when the file holds bytes that fail
    /// decryption or decode to an empty sequence.
    ///
    /// # Errors
    ///
    /// Fails only when the backing file cannot be read at all.
    pub fn integrity_check(&self, name: &str) -> CoreResult<bool> {
        let raw = self.vault.read_raw(name)?;
        if raw.is_empty() {
            return Ok(true);
        }
        match self.load(name) {
            Ok(records) => Ok(!records.is_empty()),
            Err(_) => Ok(false),
        }
    }

    /// Copies the collection's sealed bytes to a backup file.
    ///
    /// Returns the backup path, or `None` when the backing file is
    /// empty and there is nothing to copy.
    ///
    /// # Errors
    ///
    /// Fails when the backing file cannot be read or the backup
    /// written.
    pub fn backup(
        &self,
        name: &str,
        custom_name: Option<&str>,
        folder: &str,
    ) -> CoreResult<Option<PathBuf>> {
        Ok(self.vault.backup(name, custom_name, folder)?)
    }

    /// Copies backup bytes back over a live collection file.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` when the backup is missing, or when the
    /// copy itself fails.
    pub fn restore(
        &self,
        backup_name: &str,
        folder: &str,
        target: Option<&str>,
    ) -> CoreResult<()> {
        Ok(self.vault.restore(backup_name, folder, target)?)
    }

    /// Removes a live collection file or a backup file.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` when the file is missing.
    pub fn delete(&self, kind: FileKind, name: &str, folder: &str) -> CoreResult<()> {
        Ok(self.vault.remove(kind, name, folder)?)
    }

    /// Decrypts the collection into a plaintext `.json` sidecar file.
    ///
    /// # Errors
    ///
    /// Fails when the collection cannot be read or the sidecar
    /// written.
    pub fn export_plaintext(&self, name: &str, dest: &str) -> CoreResult<PathBuf> {
        Ok(self.vault.export_plaintext(name, dest)?)
    }

    /// Seals a plaintext `.json` sidecar file into a collection blob.
    ///
    /// # Errors
    ///
    /// Fails when the sidecar cannot be read or the collection
    /// written.
    pub fn import_plaintext(&self, src: &str, dest: &str) -> CoreResult<PathBuf> {
        Ok(self.vault.import_plaintext(src, dest)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealdb_codec::Value;
    use sealdb_storage::{CipherKind, EncryptionContext};
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> RecordStore {
        let context =
            EncryptionContext::derive_from_passphrase(CipherKind::Aes256Gcm, b"test", b"salt")
                .unwrap();
        RecordStore::new(Vault::new(dir.path(), context))
    }

    fn record(json: &str) -> Record {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn insert_then_read_back() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("people").unwrap();
        store.insert("people", record(r#"{"name":"a","age":7}"#)).unwrap();
        store.insert("people", record(r#"{"name":"b","age":5}"#)).unwrap();

        let records = store.records("people").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&Value::from("a")));
    }

    #[test]
    fn reversed_order_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("people").unwrap();
        store
            .insert_many(
                "people",
                [record(r#"{"n":1}"#), record(r#"{"n":2}"#), record(r#"{"n":3}"#)],
            )
            .unwrap();

        let records = store
            .records_ordered("people", SelectOrder::Reversed)
            .unwrap();
        assert_eq!(records[0].get("n"), Some(&Value::Int(3)));
    }

    #[test]
    fn select_filters_with_the_predicate() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("people").unwrap();
        store
            .insert_many(
                "people",
                [
                    record(r#"{"name":"a","age":7}"#),
                    record(r#"{"name":"b","age":5}"#),
                    record(r#"{"name":"c","age":9}"#),
                ],
            )
            .unwrap();

        let matches = store
            .select_where("people", &Predicate::gt("age", 6), SelectOrder::Stored)
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].get("name"), Some(&Value::from("a")));

        let reversed = store
            .select_where("people", &Predicate::gt("age", 6), SelectOrder::Reversed)
            .unwrap();
        assert_eq!(reversed[0].get("name"), Some(&Value::from("c")));
    }

    #[test]
    fn update_patches_only_matching_records() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("people").unwrap();
        store
            .insert_many(
                "people",
                [
                    record(r#"{"name":"a","age":7,"city":"x"}"#),
                    record(r#"{"name":"b","age":5,"city":"y"}"#),
                ],
            )
            .unwrap();

        let touched = store
            .update_where(
                "people",
                &Predicate::eq("name", "a"),
                &record(r#"{"age":8}"#),
            )
            .unwrap();
        assert_eq!(touched, 1);

        let records = store.records("people").unwrap();
        assert_eq!(records[0].get("age"), Some(&Value::Int(8)));
        assert_eq!(records[0].get("city"), Some(&Value::from("x")));
        assert_eq!(records[1].get("age"), Some(&Value::Int(5)));
    }

    #[test]
    fn delete_then_select_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("people").unwrap();
        store
            .insert_many(
                "people",
                [record(r#"{"age":7}"#), record(r#"{"age":5}"#)],
            )
            .unwrap();

        let removed = store
            .delete_where("people", &Predicate::gt("age", 6))
            .unwrap();
        assert_eq!(removed, 1);

        let matches = store
            .select_where("people", &Predicate::gt("age", 6), SelectOrder::Stored)
            .unwrap();
        assert!(matches.is_empty());
        assert_eq!(store.records("people").unwrap().len(), 1);
    }

    #[test]
    fn aggregate_field_skips_non_numeric_values() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("people").unwrap();
        store
            .insert_many(
                "people",
                [
                    record(r#"{"age":7}"#),
                    record(r#"{"age":"5"}"#),
                    record(r#"{"age":"old"}"#),
                    record(r#"{"name":"no age"}"#),
                ],
            )
            .unwrap();

        let sum = store
            .aggregate_field("people", "age", AggregateOp::Sum)
            .unwrap();
        assert_eq!(sum, 12.0);
        let count = store
            .aggregate_field("people", "age", AggregateOp::Count)
            .unwrap();
        assert_eq!(count, 2.0);
    }

    #[test]
    fn integrity_check_states() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("c").unwrap();
        // Freshly created, empty backing file.
        assert!(store.integrity_check("c").unwrap());

        store.insert("c", record(r#"{"n":1}"#)).unwrap();
        assert!(store.integrity_check("c").unwrap());

        // Corrupt the sealed bytes.
        std::fs::write(store.vault().collection_path("c"), b"garbage").unwrap();
        assert!(!store.integrity_check("c").unwrap());
    }

    #[test]
    fn backup_and_restore_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("c").unwrap();
        store.insert("c", record(r#"{"n":1}"#)).unwrap();

        let path = store.backup("c", Some("snap"), "backup").unwrap().unwrap();
        assert!(path.ends_with("snap.bak"));

        store.insert("c", record(r#"{"n":2}"#)).unwrap();
        assert_eq!(store.records("c").unwrap().len(), 2);

        store.restore("snap.bak", "backup", Some("c")).unwrap();
        assert_eq!(store.records("c").unwrap().len(), 1);
    }

    #[test]
    fn export_then_import_preserves_records() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("c").unwrap();
        store.insert("c", record(r#"{"n":1}"#)).unwrap();

        store.export_plaintext("c", "c_plain").unwrap();
        store.import_plaintext("c_plain", "copy").unwrap();
        assert_eq!(store.records("copy").unwrap(), store.records("c").unwrap());
    }

    #[test]
    fn delete_removes_files_by_kind() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_collection("c").unwrap();
        store.insert("c", record(r#"{"n":1}"#)).unwrap();
        store.backup("c", Some("snap"), "backup").unwrap();

        store.delete(FileKind::Backup, "snap.bak", "backup").unwrap();
        store.delete(FileKind::Collection, "c", "backup").unwrap();
        assert!(!store.vault().exists("c"));
    }
}
