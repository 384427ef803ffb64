//! Vault lifecycle and file operations.

use crate::config::VaultConfig;
use crate::credential::CredentialSource;
use crate::dir::{clear_directory, VaultDir, RESERVED_NAMES};
use crate::error::{VaultError, VaultResult};
use crate::manifest::Manifest;
use parking_lot::RwLock;
use sovra_platform::{PathResolver, PlatformInfo, ResolvedDirs};
use sovra_storage::{
    BlobStore, CancellationToken, EncryptedStore, Envelope, FileStore, RelativePath,
};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle state of a [`Vault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// Created but not yet initialized.
    Uninitialized,
    /// Serving file operations.
    Ready,
    /// Closed; the key has been released.
    Closed,
}

enum Lifecycle {
    Uninitialized,
    Ready(Arc<ReadyVault>),
    Closed,
}

/// Everything an initialized vault holds. Dropped when the vault is closed
/// and the last in-flight operation finishes, which zeroizes the key and
/// releases the directory lock.
struct ReadyVault {
    dir: VaultDir,
    dirs: ResolvedDirs,
    manifest: Manifest,
    store: EncryptedStore<FileStore>,
}

/// A local encrypted content store.
///
/// Callers address files by relative path strings; content is encrypted at
/// rest with a key derived from a [`CredentialSource`] and every write is
/// crash-safe.
///
/// # Lifecycle
///
/// ```text
/// new() ──► Uninitialized ──initialize()──► Ready ──close()──► Closed
/// ```
///
/// File operations fail with [`VaultError::NotInitialized`] before
/// `initialize` and with [`VaultError::Closed`] after `close`; `exists`
/// returns `false` in both states.
///
/// # Thread Safety
///
/// `Vault` is `Send + Sync`. Writes and deletes of the same path are
/// serialized; everything else runs concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use sovra_core::{StaticCredential, Vault, VaultConfig};
///
/// let vault = Vault::new(VaultConfig::new().app_name("notes"));
/// vault.initialize(&StaticCredential::new(b"host supplied key".to_vec()))?;
///
/// vault.write_bytes("journal/today.md", b"dear diary")?;
/// assert_eq!(vault.read_bytes("journal/today.md")?, b"dear diary");
/// assert!(vault.delete_file("journal/today.md")?);
/// # Ok::<(), sovra_core::VaultError>(())
/// ```
pub struct Vault {
    config: VaultConfig,
    resolver: PathResolver,
    state: RwLock<Lifecycle>,
}

impl Vault {
    /// Creates an uninitialized vault.
    #[must_use]
    pub fn new(config: VaultConfig) -> Self {
        let resolver = config.resolver();
        Self {
            config,
            resolver,
            state: RwLock::new(Lifecycle::Uninitialized),
        }
    }

    /// Creates and initializes a vault in one step.
    pub fn open(config: VaultConfig, credential: &dyn CredentialSource) -> VaultResult<Self> {
        let vault = Self::new(config);
        vault.initialize(credential)?;
        Ok(vault)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> VaultState {
        match &*self.state.read() {
            Lifecycle::Uninitialized => VaultState::Uninitialized,
            Lifecycle::Ready(_) => VaultState::Ready,
            Lifecycle::Closed => VaultState::Closed,
        }
    }

    /// Descriptor of the platform whose directory conventions are applied.
    #[must_use]
    pub fn platform(&self) -> PlatformInfo {
        self.resolver.platform()
    }

    /// Resolves directories, derives the key and starts serving.
    ///
    /// On first use this creates the manifest; afterwards it verifies that
    /// the credential opens the vault. Stale temporaries from interrupted
    /// writes are removed and the scratch directory is emptied.
    ///
    /// Calling this on a ready vault does nothing.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Closed`] if the vault was closed
    /// - [`VaultError::Platform`] if the directories are unavailable
    /// - [`VaultError::Locked`] if another vault serves the directory
    /// - [`VaultError::KeyMismatch`] if the credential does not open the vault
    /// - [`VaultError::Credential`] if the credential source fails
    pub fn initialize(&self, credential: &dyn CredentialSource) -> VaultResult<()> {
        let mut state = self.state.write();
        match &*state {
            Lifecycle::Ready(_) => return Ok(()),
            Lifecycle::Closed => return Err(VaultError::Closed),
            Lifecycle::Uninitialized => {}
        }

        let ready = self.bring_up(credential)?;
        tracing::info!(
            vault_id = %ready.manifest.vault_id,
            path = %ready.dirs.private_data.display(),
            credential = %credential.describe(),
            "vault ready"
        );
        *state = Lifecycle::Ready(Arc::new(ready));
        Ok(())
    }

    fn bring_up(&self, credential: &dyn CredentialSource) -> VaultResult<ReadyVault> {
        let dirs = self.resolver.resolve()?;
        let dir = VaultDir::open(&dirs.private_data)?;
        let material = credential.key_material()?;

        let store = FileStore::open(&dirs.private_data)?
            .with_reserved_names(RESERVED_NAMES)
            .sync_writes(self.config.sync_writes);

        let (manifest, envelope) = match dir.load_manifest()? {
            Some(manifest) => {
                let key = manifest.file_key(&material)?;
                let envelope = Envelope::new(key);
                manifest.verify_key(&envelope)?;
                (manifest, envelope)
            }
            None => {
                // Content without a manifest can never be decrypted again;
                // refuse rather than silently starting a second key.
                if !store.list(None)?.is_empty() {
                    return Err(VaultError::invalid_manifest(
                        "manifest missing but the directory holds content",
                    ));
                }
                let mut manifest = Manifest::create(self.resolver.platform().kind)
                    .with_passphrase_kdf(credential.stretch_params());
                let key = manifest.file_key(&material)?;
                let envelope = Envelope::new(key);
                manifest.seal_key_check(&envelope)?;
                dir.save_manifest(&manifest)?;
                tracing::info!(vault_id = %manifest.vault_id, "created vault");
                (manifest, envelope)
            }
        };

        if self.config.sweep_on_open {
            let swept = store.sweep_temporaries()?;
            if swept > 0 {
                tracing::warn!(count = swept, "removed temporaries of interrupted writes");
            }
        }
        if self.config.clear_temp_on_open {
            let cleared = clear_directory(&dirs.temp_workspace)?;
            tracing::debug!(count = cleared, path = %dirs.temp_workspace.display(), "cleared temp workspace");
        }

        Ok(ReadyVault {
            dir,
            dirs,
            manifest,
            store: EncryptedStore::new(store, envelope),
        })
    }

    /// Stops serving and releases the key.
    ///
    /// Operations already running finish normally; the key is zeroized and
    /// the directory lock released once the last of them returns. Closing
    /// twice is allowed.
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.state.write(), Lifecycle::Closed);
        if let Lifecycle::Ready(ready) = previous {
            tracing::info!(
                vault_id = %ready.manifest.vault_id,
                path = %ready.dir.path().display(),
                "vault closed"
            );
        }
    }

    fn ready(&self) -> VaultResult<Arc<ReadyVault>> {
        match &*self.state.read() {
            Lifecycle::Ready(ready) => Ok(Arc::clone(ready)),
            Lifecycle::Uninitialized => Err(VaultError::NotInitialized),
            Lifecycle::Closed => Err(VaultError::Closed),
        }
    }

    /// Returns true if a file is stored at `path`.
    ///
    /// Never fails: invalid paths, lifecycle states other than ready and
    /// device errors all read as `false`.
    pub fn exists(&self, path: &str) -> bool {
        let Ok(ready) = self.ready() else {
            return false;
        };
        RelativePath::new(path).is_ok_and(|path| ready.store.exists(&path))
    }

    /// Reads and decrypts the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::NotFound`](crate::ErrorKind::NotFound) if absent
    /// - [`ErrorKind::DecryptionFailed`](crate::ErrorKind::DecryptionFailed)
    ///   if the content was tampered with or moved
    /// - [`ErrorKind::InvalidPath`](crate::ErrorKind::InvalidPath) if the
    ///   path escapes the vault
    pub fn read_bytes(&self, path: &str) -> VaultResult<Vec<u8>> {
        let ready = self.ready()?;
        let path = RelativePath::new(path)?;
        let data = ready.store.read(&path)?;
        tracing::debug!(path = %path, bytes = data.len(), "read");
        Ok(data)
    }

    /// Encrypts `data` and atomically replaces the file at `path`.
    ///
    /// Parent directories are created as needed.
    pub fn write_bytes(&self, path: &str, data: &[u8]) -> VaultResult<()> {
        self.write_bytes_cancellable(path, data, &CancellationToken::new())
    }

    /// Like [`write_bytes`](Self::write_bytes), abandoning the write if
    /// `cancel` fires before the new content is committed.
    ///
    /// A cancelled write leaves the previous content and no temporary file.
    pub fn write_bytes_cancellable(
        &self,
        path: &str,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> VaultResult<()> {
        let ready = self.ready()?;
        let path = RelativePath::new(path)?;
        ready.store.write_cancellable(&path, data, cancel)?;
        Ok(())
    }

    /// Deletes the file at `path`.
    ///
    /// Returns `false` if nothing was stored there.
    pub fn delete_file(&self, path: &str) -> VaultResult<bool> {
        let ready = self.ready()?;
        let path = RelativePath::new(path)?;
        Ok(ready.store.delete(&path)?)
    }

    /// Lists stored files, optionally only those under `prefix`.
    ///
    /// The result is sorted.
    pub fn list(&self, prefix: Option<&str>) -> VaultResult<Vec<RelativePath>> {
        let ready = self.ready()?;
        let prefix = prefix.map(RelativePath::new).transpose()?;
        Ok(ready.store.list(prefix.as_ref())?)
    }

    /// Writes, reads back and deletes a check file through the full
    /// encrypted path.
    ///
    /// The check file has a reserved name: it never shows up in [`list`](Self::list)
    /// and is swept on the next start if the check is interrupted.
    pub fn health_check(&self) -> VaultResult<()> {
        let ready = self.ready()?;
        let check = RelativePath::health_check();
        let payload = check.as_str().as_bytes();

        ready.store.write(&check, payload)?;
        let result = ready.store.read(&check);
        ready.store.delete(&check)?;

        if result? != payload {
            return Err(VaultError::from(sovra_storage::StorageError::decryption_failed(
                check.as_str(),
                "health check read back different content",
            )));
        }
        tracing::debug!("health check passed");
        Ok(())
    }

    /// Identifier assigned when the vault was created.
    pub fn vault_id(&self) -> VaultResult<Uuid> {
        Ok(self.ready()?.manifest.vault_id)
    }

    /// The private data directory, created if absent.
    pub fn private_data_directory(&self) -> VaultResult<PathBuf> {
        if let Ok(ready) = self.ready() {
            return Ok(ready.dirs.private_data.clone());
        }
        Ok(self.resolver.private_data_directory()?)
    }

    /// The scratch directory, created if absent.
    pub fn temp_workspace_directory(&self) -> VaultResult<PathBuf> {
        if let Ok(ready) = self.ready() {
            return Ok(ready.dirs.temp_workspace.clone());
        }
        Ok(self.resolver.temp_workspace_directory()?)
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("app_name", &self.config.app_name)
            .field("platform", &self.resolver.platform().kind)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StaticCredential;
    use tempfile::TempDir;

    fn config(root: &TempDir) -> VaultConfig {
        VaultConfig::new()
            .data_dir(root.path().join("data"))
            .temp_dir(root.path().join("tmp"))
    }

    fn key() -> StaticCredential {
        StaticCredential::new(b"unit test key material".to_vec())
    }

    #[test]
    fn lifecycle_states() {
        let root = tempfile::tempdir().unwrap();
        let vault = Vault::new(config(&root));
        assert_eq!(vault.state(), VaultState::Uninitialized);
        assert!(matches!(vault.read_bytes("a"), Err(VaultError::NotInitialized)));

        vault.initialize(&key()).unwrap();
        assert_eq!(vault.state(), VaultState::Ready);
        vault.initialize(&key()).unwrap();

        vault.close();
        assert_eq!(vault.state(), VaultState::Closed);
        assert!(matches!(vault.write_bytes("a", b"x"), Err(VaultError::Closed)));
        assert!(matches!(vault.initialize(&key()), Err(VaultError::Closed)));
        assert!(!vault.exists("a"));
        vault.close();
    }

    #[test]
    fn reserved_files_are_invisible() {
        let root = tempfile::tempdir().unwrap();
        let vault = Vault::open(config(&root), &key()).unwrap();

        assert!(!vault.exists("MANIFEST"));
        assert!(!vault.exists("LOCK"));
        assert!(vault.list(None).unwrap().is_empty());
        assert!(vault.read_bytes("MANIFEST").is_err());
        assert!(vault.write_bytes("LOCK", b"x").is_err());
    }

    #[test]
    fn health_check_leaves_nothing() {
        let root = tempfile::tempdir().unwrap();
        let vault = Vault::open(config(&root), &key()).unwrap();

        vault.health_check().unwrap();
        assert!(vault.list(None).unwrap().is_empty());
    }

    #[test]
    fn missing_manifest_with_content_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("orphan"), b"ciphertext").unwrap();

        let result = Vault::open(config(&root), &key());
        assert!(matches!(result, Err(VaultError::InvalidManifest { .. })));
    }

    #[test]
    fn directories_before_initialize() {
        let root = tempfile::tempdir().unwrap();
        let vault = Vault::new(config(&root));

        let private = vault.private_data_directory().unwrap();
        let temp = vault.temp_workspace_directory().unwrap();
        assert!(root.path().join("data").is_dir());
        assert_eq!(private, std::fs::canonicalize(root.path().join("data")).unwrap());
        assert_eq!(temp, std::fs::canonicalize(root.path().join("tmp")).unwrap());
    }
}
