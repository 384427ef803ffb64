//! # Sovra Core
//!
//! Sovereign private data vault.
//!
//! This crate provides:
//! - [`Vault`]: a local encrypted content store with a small lifecycle
//!   (uninitialized, ready, closed)
//! - Platform-conventional directory resolution via `sovra_platform`
//! - Crash-safe, path-bound encrypted storage via `sovra_storage`
//! - Key derivation from pluggable [`CredentialSource`]s
//! - [`AsyncVault`], a tokio facade with cancellation on drop
//!
//! ## Example
//!
//! ```rust,no_run
//! use sovra_core::{PassphraseCredential, Vault, VaultConfig};
//!
//! let vault = Vault::open(VaultConfig::from_env(), &PassphraseCredential::from_env())?;
//! vault.write_bytes("models/weights.bin", &[0u8; 16])?;
//! for path in vault.list(None)? {
//!     println!("{path}");
//! }
//! # Ok::<(), sovra_core::VaultError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod async_vault;
mod config;
mod credential;
mod dir;
mod error;
mod manifest;
mod vault;

pub use async_vault::AsyncVault;
pub use config::{VaultConfig, DEFAULT_APP_NAME, ENV_APP_NAME, ENV_DATA_DIR, ENV_TEMP_DIR};
#[cfg(feature = "os-keyring")]
pub use credential::KeyringCredential;
pub use credential::{
    derive_file_key, CredentialSource, KdfParams, PassphraseCredential, StaticCredential,
    ENV_PASSPHRASE, MIN_MATERIAL_LEN,
};
pub use dir::{LOCK_FILE, MANIFEST_FILE};
pub use error::{ErrorKind, VaultError, VaultResult};
pub use manifest::{Manifest, MANIFEST_VERSION};
pub use vault::{Vault, VaultState};

pub use sovra_platform::{current_platform, PlatformInfo, PlatformKind};
pub use sovra_storage::{CancellationToken, RelativePath, MAX_COMPONENT_LEN};
