//! Key material sources and file key derivation.
//!
//! A [`CredentialSource`] supplies root key material; the vault never stores
//! it. The file key is derived from that material and the manifest salt:
//!
//! ```text
//! file key = HKDF-SHA256(ikm = material, salt = kdf_salt, info = "sovra-file-key-v1")
//! ```
//!
//! HKDF is not a password hash. Low-entropy material (passphrases) is first
//! stretched with Argon2id under [`KdfParams`] recorded in the manifest:
//!
//! ```text
//! ikm = Argon2id(material, salt = kdf_salt, params)
//! ```
//!
//! The same material therefore opens one vault only, and replacing the salt
//! (re-creating the vault) yields an unrelated key.

use crate::error::{VaultError, VaultResult};
use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sovra_storage::{EncryptionKey, KEY_SIZE};
use std::ffi::OsString;
use zeroize::Zeroizing;

/// HKDF info string for the file encryption key.
const FILE_KEY_INFO: &[u8] = b"sovra-file-key-v1";

/// Minimum accepted length of passphrase or raw key material.
pub const MIN_MATERIAL_LEN: usize = 8;

/// Environment variable read by [`PassphraseCredential::from_env`].
pub const ENV_PASSPHRASE: &str = "SOVRA_PASSPHRASE";

/// Argon2id cost parameters for stretching passphrase material.
///
/// Stored in the manifest at creation so later opens reproduce the key even
/// if the defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost_kib: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for KdfParams {
    /// OWASP baseline for Argon2id: 19 MiB, two passes, one lane.
    fn default() -> Self {
        Self {
            m_cost_kib: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    /// Validates the parameters against Argon2's limits.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Credential`] if any cost is out of range.
    pub fn validate(&self) -> VaultResult<()> {
        self.to_argon2().map(|_| ())
    }

    fn to_argon2(self) -> VaultResult<Params> {
        Params::new(self.m_cost_kib, self.t_cost, self.p_cost, Some(KEY_SIZE))
            .map_err(|e| VaultError::credential(format!("invalid Argon2 parameters: {e}")))
    }

    /// Stretches `material` into 32 bytes of high-entropy key material.
    fn stretch(&self, material: &[u8], salt: &[u8]) -> VaultResult<Zeroizing<[u8; KEY_SIZE]>> {
        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.to_argon2()?);
        let mut out = Zeroizing::new([0u8; KEY_SIZE]);
        argon
            .hash_password_into(material, salt, &mut *out)
            .map_err(|e| VaultError::credential(format!("Argon2 stretching failed: {e}")))?;
        Ok(out)
    }
}

/// Supplies root key material for a vault.
pub trait CredentialSource: Send + Sync {
    /// Returns the root key material.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Credential`] if no material is available.
    fn key_material(&self) -> VaultResult<Zeroizing<Vec<u8>>>;

    /// Short description for logs. Must not reveal the material.
    fn describe(&self) -> String;

    /// Argon2id parameters for a new vault, or `None` for high-entropy
    /// material that goes straight to HKDF.
    fn stretch_params(&self) -> Option<KdfParams> {
        None
    }
}

/// Derives the file encryption key from root material and the vault salt.
///
/// With `stretch`, the material is run through Argon2id before HKDF.
pub fn derive_file_key(
    material: &[u8],
    salt: &[u8],
    stretch: Option<&KdfParams>,
) -> VaultResult<EncryptionKey> {
    if material.len() < MIN_MATERIAL_LEN {
        return Err(VaultError::credential(format!(
            "key material too short: need at least {MIN_MATERIAL_LEN} bytes"
        )));
    }
    let stretched = stretch.map(|p| p.stretch(material, salt)).transpose()?;
    let ikm: &[u8] = match &stretched {
        Some(out) => &out[..],
        None => material,
    };
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    hk.expand(FILE_KEY_INFO, &mut *okm)
        .map_err(|_| VaultError::credential("HKDF expansion failed"))?;
    EncryptionKey::from_bytes(&*okm).map_err(VaultError::from)
}

/// Key material handed over directly by the host application.
pub struct StaticCredential {
    material: Zeroizing<Vec<u8>>,
}

impl StaticCredential {
    /// Wraps raw key material.
    pub fn new(material: impl Into<Vec<u8>>) -> Self {
        Self {
            material: Zeroizing::new(material.into()),
        }
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredential")
            .field("material", &"[REDACTED]")
            .finish()
    }
}

impl CredentialSource for StaticCredential {
    fn key_material(&self) -> VaultResult<Zeroizing<Vec<u8>>> {
        Ok(self.material.clone())
    }

    fn describe(&self) -> String {
        "static key material".to_string()
    }
}

/// A passphrase read from an environment variable at initialization time.
///
/// Passphrases are stretched with Argon2id; see [`KdfParams`].
#[derive(Debug, Clone)]
pub struct PassphraseCredential {
    var: String,
    params: KdfParams,
}

impl PassphraseCredential {
    /// Reads the passphrase from `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            params: KdfParams::default(),
        }
    }

    /// Sets the Argon2id parameters used when this passphrase creates a vault.
    ///
    /// Existing vaults keep the parameters recorded in their manifest.
    #[must_use]
    pub fn with_params(mut self, params: KdfParams) -> Self {
        self.params = params;
        self
    }

    /// Reads the passphrase from `SOVRA_PASSPHRASE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ENV_PASSPHRASE)
    }

    /// The variable the passphrase is read from.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialSource for PassphraseCredential {
    fn key_material(&self) -> VaultResult<Zeroizing<Vec<u8>>> {
        let value: OsString = std::env::var_os(&self.var)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| VaultError::credential(format!("{} is not set", self.var)))?;
        let value = value
            .into_string()
            .map_err(|_| VaultError::credential(format!("{} is not valid UTF-8", self.var)))?;
        Ok(Zeroizing::new(value.into_bytes()))
    }

    fn describe(&self) -> String {
        format!("passphrase from ${}", self.var)
    }

    fn stretch_params(&self) -> Option<KdfParams> {
        Some(self.params)
    }
}

#[cfg(feature = "os-keyring")]
pub use keyring_source::KeyringCredential;

#[cfg(feature = "os-keyring")]
mod keyring_source {
    use super::{CredentialSource, KEY_SIZE};
    use crate::error::{VaultError, VaultResult};
    use rand::RngCore;
    use zeroize::Zeroizing;

    /// Key material kept in the OS credential store.
    ///
    /// Random material is generated and stored on first use.
    #[derive(Debug, Clone)]
    pub struct KeyringCredential {
        service: String,
        user: String,
    }

    impl KeyringCredential {
        /// Uses the entry `service`/`user` of the OS credential store.
        pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
            Self {
                service: service.into(),
                user: user.into(),
            }
        }

        fn entry(&self) -> VaultResult<keyring::Entry> {
            keyring::Entry::new(&self.service, &self.user).map_err(|e| {
                VaultError::credential(format!("failed to open keyring entry: {e}"))
            })
        }
    }

    impl CredentialSource for KeyringCredential {
        fn key_material(&self) -> VaultResult<Zeroizing<Vec<u8>>> {
            let entry = self.entry()?;
            match entry.get_secret() {
                Ok(secret) => Ok(Zeroizing::new(secret)),
                Err(keyring::Error::NoEntry) => {
                    tracing::info!(service = %self.service, "creating vault key material in keyring");
                    let mut secret = Zeroizing::new(vec![0u8; KEY_SIZE]);
                    rand::thread_rng().fill_bytes(&mut secret);
                    entry.set_secret(&secret).map_err(|e| {
                        VaultError::credential(format!("failed to store key material: {e}"))
                    })?;
                    Ok(secret)
                }
                Err(e) => Err(VaultError::credential(format!(
                    "failed to read key material: {e}"
                ))),
            }
        }

        fn describe(&self) -> String {
            format!("OS keyring entry {}/{}", self.service, self.user)
        }
    }
}
