//! Test fixtures and vault helpers.
//!
//! Provides convenience functions for setting up test vaults in temporary
//! directories.

use sovra_core::{StaticCredential, Vault, VaultConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Key material used by every fixture vault.
pub const TEST_KEY_MATERIAL: &[u8] = b"sovra testkit key material";

/// The credential fixture vaults are opened with.
pub fn test_credential() -> StaticCredential {
    StaticCredential::new(TEST_KEY_MATERIAL.to_vec())
}

/// A vault configuration rooted at `root`.
pub fn test_config(root: &Path) -> VaultConfig {
    VaultConfig::new()
        .app_name("sovra-test")
        .data_dir(root.join("data"))
        .temp_dir(root.join("scratch"))
}

/// A test vault with automatic cleanup.
pub struct TestVault {
    /// The vault instance.
    pub vault: Vault,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestVault {
    /// Creates and initializes a vault in a fresh temporary directory.
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Like [`new`](Self::new), letting the caller adjust the configuration.
    pub fn with_config(adjust: impl FnOnce(VaultConfig) -> VaultConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = adjust(test_config(temp_dir.path()));
        let vault = Vault::open(config, &test_credential()).expect("Failed to open test vault");
        Self { vault, temp_dir }
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory holding the encrypted content.
    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    /// Closes the vault and opens a new one on the same directories.
    pub fn reopen(self) -> Self {
        let Self { vault, temp_dir } = self;
        let config = vault.config().clone();
        vault.close();
        drop(vault);
        let vault = Vault::open(config, &test_credential()).expect("Failed to reopen test vault");
        Self { vault, temp_dir }
    }
}

impl Default for TestVault {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestVault {
    type Target = Vault;

    fn deref(&self) -> &Self::Target {
        &self.vault
    }
}

/// Runs a test with a temporary vault.
///
/// # Example
///
/// ```rust
/// use sovra_testkit::with_temp_vault;
///
/// with_temp_vault(|vault| {
///     vault.write_bytes("k", b"v").unwrap();
///     assert_eq!(vault.read_bytes("k").unwrap(), b"v");
/// });
/// ```
pub fn with_temp_vault<F, R>(f: F) -> R
where
    F: FnOnce(&Vault) -> R,
{
    let vault = TestVault::new();
    f(&vault)
}

/// Common fixtures.
pub mod fixtures {
    use super::*;

    /// A vault holding `count` files named `file-<i>` with content
    /// `content-<i>`.
    pub fn populated_vault(count: usize) -> TestVault {
        let vault = TestVault::new();
        for i in 0..count {
            vault
                .write_bytes(&format!("file-{i}"), format!("content-{i}").as_bytes())
                .expect("Failed to populate vault");
        }
        vault
    }

    /// A vault holding one file in each of `dirs` nested directories.
    pub fn nested_vault(dirs: usize) -> TestVault {
        let vault = TestVault::new();
        let mut path = String::new();
        for i in 0..dirs {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&format!("d{i}"));
            vault
                .write_bytes(&format!("{path}/leaf"), path.as_bytes())
                .expect("Failed to populate vault");
        }
        vault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populated_vault_lists_everything() {
        let vault = fixtures::populated_vault(5);
        assert_eq!(vault.list(None).unwrap().len(), 5);
        assert_eq!(vault.read_bytes("file-3").unwrap(), b"content-3");
    }

    #[test]
    fn nested_vault_creates_directories() {
        let vault = fixtures::nested_vault(3);
        assert_eq!(vault.read_bytes("d0/d1/d2/leaf").unwrap(), b"d0/d1/d2");
        assert!(vault.data_dir().join("d0/d1").is_dir());
    }

    #[test]
    fn reopen_keeps_content() {
        let vault = TestVault::new();
        vault.write_bytes("kept", b"yes").unwrap();

        let vault = vault.reopen();
        assert_eq!(vault.read_bytes("kept").unwrap(), b"yes");
    }
}
