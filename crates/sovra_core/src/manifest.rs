//! Vault manifest.
//!
//! The manifest is a small CBOR document stored next to the vault content.
//! It carries no secrets: the KDF salt and Argon2 parameters are public and
//! the key check is an envelope that only the right key opens.

use crate::credential::{derive_file_key, KdfParams};
use crate::error::{VaultError, VaultResult};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sovra_platform::PlatformKind;
use sovra_storage::{EncryptionKey, Envelope};
use uuid::Uuid;

/// Current manifest format version.
pub const MANIFEST_VERSION: u16 = 1;

/// Size of the KDF salt in bytes.
pub const SALT_SIZE: usize = 32;

/// Envelope context of the key check. Never a valid relative path, so it
/// cannot collide with stored content.
const KEY_CHECK_CONTEXT: &str = "/key-check";

/// Plaintext sealed into the key check.
const KEY_CHECK_CANARY: &[u8] = b"sovra vault key check";

/// Persistent vault metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version of the vault layout.
    pub format_version: u16,
    /// Random identifier assigned at creation.
    pub vault_id: Uuid,
    /// Platform that created the vault (`PlatformKind::as_str`).
    pub created_by: String,
    /// Salt for file key derivation.
    pub kdf_salt: Vec<u8>,
    /// Canary sealed with the file key.
    pub key_check: Vec<u8>,
    /// Argon2id parameters when the vault was created from a passphrase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase_kdf: Option<KdfParams>,
}

impl Manifest {
    /// Creates a manifest for a new vault with a fresh id and salt.
    ///
    /// The key check is empty until [`seal_key_check`](Self::seal_key_check)
    /// is called with the derived key.
    #[must_use]
    pub fn create(platform: PlatformKind) -> Self {
        let mut kdf_salt = vec![0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut kdf_salt);
        Self {
            format_version: MANIFEST_VERSION,
            vault_id: Uuid::new_v4(),
            created_by: platform.as_str().to_string(),
            kdf_salt,
            key_check: Vec::new(),
            passphrase_kdf: None,
        }
    }

    /// Records the Argon2id parameters that stretch this vault's material.
    #[must_use]
    pub fn with_passphrase_kdf(mut self, params: Option<KdfParams>) -> Self {
        self.passphrase_kdf = params;
        self
    }

    /// Derives the file key from root material, stretching it when the
    /// manifest records Argon2id parameters.
    pub fn file_key(&self, material: &[u8]) -> VaultResult<EncryptionKey> {
        derive_file_key(material, &self.kdf_salt, self.passphrase_kdf.as_ref())
    }

    /// Platform that created the vault, if recognized.
    #[must_use]
    pub fn created_by(&self) -> Option<PlatformKind> {
        PlatformKind::from_str_id(&self.created_by)
    }

    /// Seals the key check canary with `envelope`.
    pub fn seal_key_check(&mut self, envelope: &Envelope) -> VaultResult<()> {
        self.key_check = envelope.seal(KEY_CHECK_CONTEXT, KEY_CHECK_CANARY)?;
        Ok(())
    }

    /// Verifies that `envelope` holds the key this vault was created with.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::KeyMismatch`] if the key check does not open.
    pub fn verify_key(&self, envelope: &Envelope) -> VaultResult<()> {
        match envelope.open(KEY_CHECK_CONTEXT, &self.key_check) {
            Ok(canary) if canary == KEY_CHECK_CANARY => Ok(()),
            _ => Err(VaultError::KeyMismatch),
        }
    }

    /// Encodes the manifest to CBOR.
    pub fn encode(&self) -> VaultResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| VaultError::invalid_manifest(format!("encode failed: {e}")))?;
        Ok(buf)
    }

    /// Decodes and validates a manifest.
    pub fn decode(data: &[u8]) -> VaultResult<Self> {
        let manifest: Self = ciborium::de::from_reader(data)
            .map_err(|e| VaultError::invalid_manifest(format!("decode failed: {e}")))?;

        if manifest.format_version > MANIFEST_VERSION {
            return Err(VaultError::invalid_manifest(format!(
                "unsupported format version {} (newest known is {MANIFEST_VERSION})",
                manifest.format_version
            )));
        }
        if manifest.kdf_salt.len() != SALT_SIZE {
            return Err(VaultError::invalid_manifest(format!(
                "salt must be {SALT_SIZE} bytes, found {}",
                manifest.kdf_salt.len()
            )));
        }
        if manifest.key_check.is_empty() {
            return Err(VaultError::invalid_manifest("missing key check"));
        }
        if let Some(params) = &manifest.passphrase_kdf {
            params
                .validate()
                .map_err(|e| VaultError::invalid_manifest(e.to_string()))?;
        }
        Ok(manifest)
    }
}
