//! # SealDB Storage
//!
//! Encrypted collection file store for SealDB.
//!
//! This crate is an **opaque byte store**: it maps collection names to
//! files, seals plaintext bytes through the two-layer cipher, and
//! handles write locking and backup file mechanics. It never
//! interprets record structure; the codec above it owns that.
//!
//! ## Security Model
//!
//! The on-disk format is two nested AES-GCM layers with a **fixed IV**
//! shared by both layers and every write (see
//! [`EncryptionContext`]). This is layered obfuscation, not two
//! independent security margins: reusing a GCM nonce across messages
//! forfeits the cipher's nonce-uniqueness guarantees. Sealing is
//! therefore deterministic, and identical plaintext produces
//! identical ciphertext. The format is kept for compatibility with
//! existing collection files and documented here rather than silently
//! changed.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cipher;
mod context;
mod error;
mod vault;

pub use cipher::{CipherKind, IV_SIZE};
pub use context::{EncryptionContext, EncryptionKey, Iv};
pub use error::{StorageError, StorageResult};
pub use vault::{FileKind, Vault, BACKUP_DIR, BACKUP_EXT, COLLECTION_EXT, PLAINTEXT_EXT};
