//! Encryption context: cipher, keys and IV.
//!
//! The context is an immutable value established once at startup and
//! passed into [`Vault::new`](crate::Vault::new). Nothing here is
//! looked up from ambient global state, and nothing is
//! collection-specific.

use crate::cipher::{self, CipherKind, IV_SIZE};
use crate::error::{StorageError, StorageResult};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A cipher key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: Vec<u8>,
}

impl EncryptionKey {
    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice does not match the cipher's key
    /// size.
    pub fn from_bytes(kind: CipherKind, bytes: &[u8]) -> StorageResult<Self> {
        if bytes.len() != kind.key_size() {
            return Err(StorageError::InvalidKeySize {
                expected: kind.key_size(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Generates a random key for the given cipher.
    #[must_use]
    pub fn generate(kind: CipherKind) -> Self {
        let mut bytes = vec![0u8; kind.key_size()];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Derives a key from a passphrase using HKDF-SHA256.
    ///
    /// `context` separates keys derived from the same passphrase; the
    /// wrapping key, content key and IV each use a distinct context
    /// string.
    ///
    /// HKDF is a key derivation function, not a password hash. It is
    /// appropriate when the passphrase already has high entropy.
    pub fn derive_from_passphrase(
        kind: CipherKind,
        passphrase: &[u8],
        salt: &[u8],
        context: &[u8],
    ) -> StorageResult<Self> {
        let hk = Hkdf::<Sha256>::new(Some(salt), passphrase);
        let mut bytes = vec![0u8; kind.key_size()];
        hk.expand(context, &mut bytes)
            .map_err(|_| StorageError::crypto("HKDF expand failed"))?;
        Ok(Self { bytes })
    }

    /// Returns the key bytes.
    ///
    /// # Security
    ///
    /// Do not log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The fixed initialization vector shared by both layers.
#[derive(Debug, Clone)]
pub struct Iv {
    bytes: [u8; IV_SIZE],
}

impl Iv {
    /// Creates an IV from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly [`IV_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
        if bytes.len() != IV_SIZE {
            return Err(StorageError::InvalidIvSize {
                expected: IV_SIZE,
                actual: bytes.len(),
            });
        }
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(bytes);
        Ok(Self { bytes: iv })
    }

    /// Generates a random IV.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Derives an IV from a passphrase using HKDF-SHA256.
    pub fn derive_from_passphrase(
        passphrase: &[u8],
        salt: &[u8],
        context: &[u8],
    ) -> StorageResult<Self> {
        let hk = Hkdf::<Sha256>::new(Some(salt), passphrase);
        let mut bytes = [0u8; IV_SIZE];
        hk.expand(context, &mut bytes)
            .map_err(|_| StorageError::crypto("HKDF expand failed"))?;
        Ok(Self { bytes })
    }

    /// Returns the IV bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.bytes
    }
}

/// Immutable process-wide encryption parameters.
///
/// Sealing applies the content key first and the wrapping key second;
/// opening reverses the order. Both layers use the same cipher and the
/// same fixed IV, which makes the output deterministic for a given
/// plaintext. See the crate docs for why this is a weakness that is
/// nevertheless preserved.
#[derive(Debug, Clone)]
pub struct EncryptionContext {
    cipher: CipherKind,
    wrapping_key: EncryptionKey,
    content_key: EncryptionKey,
    iv: Iv,
}

impl EncryptionContext {
    /// Creates a context from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if either key does not match the cipher's key
    /// size.
    pub fn new(
        cipher: CipherKind,
        wrapping_key: EncryptionKey,
        content_key: EncryptionKey,
        iv: Iv,
    ) -> StorageResult<Self> {
        for key in [&wrapping_key, &content_key] {
            if key.as_bytes().len() != cipher.key_size() {
                return Err(StorageError::InvalidKeySize {
                    expected: cipher.key_size(),
                    actual: key.as_bytes().len(),
                });
            }
        }
        Ok(Self {
            cipher,
            wrapping_key,
            content_key,
            iv,
        })
    }

    /// Derives a full context from a passphrase and salt.
    ///
    /// The wrapping key, content key and IV are separated by distinct
    /// HKDF context strings.
    pub fn derive_from_passphrase(
        cipher: CipherKind,
        passphrase: &[u8],
        salt: &[u8],
    ) -> StorageResult<Self> {
        let wrapping_key =
            EncryptionKey::derive_from_passphrase(cipher, passphrase, salt, b"sealdb-wrap-v1")?;
        let content_key =
            EncryptionKey::derive_from_passphrase(cipher, passphrase, salt, b"sealdb-content-v1")?;
        let iv = Iv::derive_from_passphrase(passphrase, salt, b"sealdb-iv-v1")?;
        Self::new(cipher, wrapping_key, content_key, iv)
    }

    /// Returns the configured cipher.
    #[must_use]
    pub fn cipher(&self) -> CipherKind {
        self.cipher
    }

    /// Seals plaintext through both layers: content key, then
    /// wrapping key.
    pub fn seal(&self, plaintext: &[u8]) -> StorageResult<Vec<u8>> {
        let inner = cipher::encrypt_layer(
            self.cipher,
            self.content_key.as_bytes(),
            self.iv.as_bytes(),
            plaintext,
        )?;
        cipher::encrypt_layer(
            self.cipher,
            self.wrapping_key.as_bytes(),
            self.iv.as_bytes(),
            &inner,
        )
    }

    /// Opens a sealed blob: wrapping key first, then content key.
    pub fn open(&self, blob: &[u8]) -> StorageResult<Vec<u8>> {
        let inner = cipher::decrypt_layer(
            self.cipher,
            self.wrapping_key.as_bytes(),
            self.iv.as_bytes(),
            blob,
        )?;
        cipher::decrypt_layer(
            self.cipher,
            self.content_key.as_bytes(),
            self.iv.as_bytes(),
            &inner,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn context() -> EncryptionContext {
        EncryptionContext::new(
            CipherKind::Aes256Gcm,
            EncryptionKey::from_bytes(CipherKind::Aes256Gcm, &[1u8; 32]).unwrap(),
            EncryptionKey::from_bytes(CipherKind::Aes256Gcm, &[2u8; 32]).unwrap(),
            Iv::from_bytes(&[3u8; IV_SIZE]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn seal_open_round_trip() {
        let ctx = context();
        let opened = ctx.open(&ctx.seal(b"hello").unwrap()).unwrap();
        assert_eq!(opened, b"hello");
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let ctx = context();
        let opened = ctx.open(&ctx.seal(b"").unwrap()).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn key_size_validated_against_cipher() {
        let short = EncryptionKey::from_bytes(CipherKind::Aes128Gcm, &[0u8; 16]).unwrap();
        let ok = EncryptionKey::from_bytes(CipherKind::Aes256Gcm, &[0u8; 32]).unwrap();
        let result = EncryptionContext::new(
            CipherKind::Aes256Gcm,
            short,
            ok,
            Iv::from_bytes(&[0u8; IV_SIZE]).unwrap(),
        );
        assert!(matches!(result, Err(StorageError::InvalidKeySize { .. })));
    }

    #[test]
    fn swapped_keys_do_not_open() {
        let ctx = context();
        let swapped = EncryptionContext::new(
            CipherKind::Aes256Gcm,
            EncryptionKey::from_bytes(CipherKind::Aes256Gcm, &[2u8; 32]).unwrap(),
            EncryptionKey::from_bytes(CipherKind::Aes256Gcm, &[1u8; 32]).unwrap(),
            Iv::from_bytes(&[3u8; IV_SIZE]).unwrap(),
        )
        .unwrap();

        let sealed = ctx.seal(b"layer order matters").unwrap();
        assert!(swapped.open(&sealed).is_err());
    }

    #[test]
    fn derive_is_deterministic_and_salt_sensitive() {
        let a = EncryptionContext::derive_from_passphrase(
            CipherKind::Aes256Gcm,
            b"passphrase",
            b"salt",
        )
        .unwrap();
        let b = EncryptionContext::derive_from_passphrase(
            CipherKind::Aes256Gcm,
            b"passphrase",
            b"salt",
        )
        .unwrap();
        let c = EncryptionContext::derive_from_passphrase(
            CipherKind::Aes256Gcm,
            b"passphrase",
            b"pepper",
        )
        .unwrap();

        let sealed = a.seal(b"x").unwrap();
        assert_eq!(b.open(&sealed).unwrap(), b"x");
        assert!(c.open(&sealed).is_err());
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_round_trip(data in prop::collection::vec(any::<u8>(), 0..2048)) {
            let ctx = context();
            let opened = ctx.open(&ctx.seal(&data).unwrap()).unwrap();
            prop_assert_eq!(opened, data);
        }
    }
}
