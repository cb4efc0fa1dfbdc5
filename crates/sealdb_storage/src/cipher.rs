//! Cipher selection and single-layer AES-GCM operations.

use crate::error::{StorageError, StorageResult};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use std::fmt;
use std::str::FromStr;

/// Size of the GCM nonce (the context IV) in bytes.
pub const IV_SIZE: usize = 12;

/// The cipher used for both encryption layers.
///
/// Parsed from the configuration's cipher identifier, e.g.
/// `"aes-256-gcm"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherKind {
    /// AES-256-GCM (32-byte keys).
    Aes256Gcm,
    /// AES-128-GCM (16-byte keys).
    Aes128Gcm,
}

impl CipherKind {
    /// Returns the key size in bytes for this cipher.
    #[must_use]
    pub fn key_size(self) -> usize {
        match self {
            CipherKind::Aes256Gcm => 32,
            CipherKind::Aes128Gcm => 16,
        }
    }

    /// Returns the canonical identifier for this cipher.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CipherKind::Aes256Gcm => "aes-256-gcm",
            CipherKind::Aes128Gcm => "aes-128-gcm",
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherKind {
    type Err = StorageError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "aes-256-gcm" => Ok(CipherKind::Aes256Gcm),
            "aes-128-gcm" => Ok(CipherKind::Aes128Gcm),
            other => Err(StorageError::UnknownCipher {
                name: other.to_string(),
            }),
        }
    }
}

/// Encrypts one layer with the given key and IV.
pub(crate) fn encrypt_layer(
    kind: CipherKind,
    key: &[u8],
    iv: &[u8; IV_SIZE],
    plaintext: &[u8],
) -> StorageResult<Vec<u8>> {
    match kind {
        CipherKind::Aes256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(key)
                .map_err(|_| StorageError::crypto("key does not fit cipher"))?;
            cipher
                .encrypt(Nonce::from_slice(iv), plaintext)
                .map_err(|_| StorageError::crypto("encryption failed"))
        }
        CipherKind::Aes128Gcm => {
            let cipher = Aes128Gcm::new_from_slice(key)
                .map_err(|_| StorageError::crypto("key does not fit cipher"))?;
            cipher
                .encrypt(Nonce::from_slice(iv), plaintext)
                .map_err(|_| StorageError::crypto("encryption failed"))
        }
    }
}

/// Decrypts one layer with the given key and IV.
pub(crate) fn decrypt_layer(
    kind: CipherKind,
    key: &[u8],
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
) -> StorageResult<Vec<u8>> {
    match kind {
        CipherKind::Aes256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(key)
                .map_err(|_| StorageError::crypto("key does not fit cipher"))?;
            cipher
                .decrypt(Nonce::from_slice(iv), ciphertext)
                .map_err(|_| StorageError::crypto("decryption failed"))
        }
        CipherKind::Aes128Gcm => {
            let cipher = Aes128Gcm::new_from_slice(key)
                .map_err(|_| StorageError::crypto("key does not fit cipher"))?;
            cipher
                .decrypt(Nonce::from_slice(iv), ciphertext)
                .map_err(|_| StorageError::crypto("decryption failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_identifiers_parse() {
        assert_eq!(
            "aes-256-gcm".parse::<CipherKind>().unwrap(),
            CipherKind::Aes256Gcm
        );
        assert_eq!(
            "aes-128-gcm".parse::<CipherKind>().unwrap(),
            CipherKind::Aes128Gcm
        );
    }

    #[test]
    fn unknown_cipher_rejected() {
        let result = "rot13".parse::<CipherKind>();
        assert!(matches!(result, Err(StorageError::UnknownCipher { .. })));
    }

    #[test]
    fn key_sizes() {
        assert_eq!(CipherKind::Aes256Gcm.key_size(), 32);
        assert_eq!(CipherKind::Aes128Gcm.key_size(), 16);
    }

    #[test]
    fn layer_round_trip() {
        let key = [7u8; 32];
        let iv = [1u8; IV_SIZE];

        let sealed = encrypt_layer(CipherKind::Aes256Gcm, &key, &iv, b"payload").unwrap();
        assert_ne!(&sealed, b"payload");

        let opened = decrypt_layer(CipherKind::Aes256Gcm, &key, &iv, &sealed).unwrap();
        assert_eq!(opened, b"payload");
    }

    #[test]
    fn fixed_iv_is_deterministic() {
        let key = [7u8; 32];
        let iv = [1u8; IV_SIZE];

        let first = encrypt_layer(CipherKind::Aes256Gcm, &key, &iv, b"payload").unwrap();
        let second = encrypt_layer(CipherKind::Aes256Gcm, &key, &iv, b"payload").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let iv = [1u8; IV_SIZE];
        let sealed = encrypt_layer(CipherKind::Aes256Gcm, &[7u8; 32], &iv, b"payload").unwrap();

        let result = decrypt_layer(CipherKind::Aes256Gcm, &[8u8; 32], &iv, &sealed);
        assert!(matches!(result, Err(StorageError::Crypto { .. })));
    }
}
