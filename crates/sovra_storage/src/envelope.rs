//! Authenticated encryption of stored blobs.
//!
//! ## Format
//!
//! ```text
//! version (1 byte) || nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! - AES-256-GCM, fresh random nonce per seal
//! - associated data is `"sovra/v1:" || context`, where the context is the
//!   relative path of the blob; a blob copied to another path fails to open
//! - keys are never stored; they are supplied by the owner of the envelope

use crate::error::{StorageError, StorageResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;
/// Current envelope format version.
pub const FORMAT_VERSION: u8 = 1;
/// Bytes added to every plaintext.
pub const OVERHEAD: usize = 1 + NONCE_SIZE + TAG_SIZE;

const AAD_DOMAIN: &[u8] = b"sovra/v1:";

/// Encryption key for the envelope.
///
/// The key is zeroized when dropped and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generates a new random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(StorageError::Encryption(format!(
                "invalid key size: expected {KEY_SIZE}, got {}",
                bytes.len()
            )));
        }
        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Returns the key as a byte slice.
    ///
    /// # Security
    ///
    /// Don't log or persist the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
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

/// Seals and opens blobs with one key.
///
/// The envelope is immutable after construction and can be shared freely
/// between threads.
pub struct Envelope {
    cipher: Aes256Gcm,
}

impl Envelope {
    /// Creates an envelope for `key`. The key is consumed and zeroized.
    #[must_use]
    pub fn new(key: EncryptionKey) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypts `plaintext`, binding it to `context`.
    pub fn seal(&self, context: &str, plaintext: &[u8]) -> StorageResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let aad = associated_data(context);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|_| StorageError::Encryption(format!("sealing {context} failed")))?;

        let mut out = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&nonce_bytes);
        out.extend(ciphertext);
        Ok(out)
    }

    /// Decrypts a blob sealed for `context`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DecryptionFailed`] if the blob is truncated,
    /// has an unknown version, was tampered with, was sealed for another
    /// context, or the key does not match.
    pub fn open(&self, context: &str, sealed: &[u8]) -> StorageResult<Vec<u8>> {
        if sealed.len() < OVERHEAD {
            return Err(StorageError::decryption_failed(context, "ciphertext too short"));
        }
        if sealed[0] != FORMAT_VERSION {
            return Err(StorageError::decryption_failed(
                context,
                format!("unknown envelope version {}", sealed[0]),
            ));
        }

        let nonce = Nonce::from_slice(&sealed[1..1 + NONCE_SIZE]);
        let aad = associated_data(context);
        self.cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &sealed[1 + NONCE_SIZE..],
                    aad: &aad,
                },
            )
            .map_err(|_| StorageError::decryption_failed(context, "authentication failed"))
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("cipher", &"Aes256Gcm")
            .finish()
    }
}

fn associated_data(context: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(AAD_DOMAIN.len() + context.len());
    aad.extend_from_slice(AAD_DOMAIN);
    aad.extend_from_slice(context.as_bytes());
    aad
}
