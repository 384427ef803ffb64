//! Async facade over [`Vault`].
//!
//! Every operation runs on tokio's blocking pool. Dropping a write future
//! before it resolves cancels the write: if the new content has not been
//! committed yet, the previous content stays and no temporary is left
//! behind. A write that already committed stands.

use crate::error::{VaultError, VaultResult};
use crate::vault::Vault;
use sovra_storage::{CancellationToken, RelativePath};
use std::io;
use std::sync::Arc;
use tokio::task::JoinError;

/// Async handle to a shared [`Vault`].
///
/// Cloning the handle is cheap; all clones serve the same vault.
///
/// # Example
///
/// ```rust,no_run
/// use sovra_core::{AsyncVault, StaticCredential, Vault, VaultConfig};
///
/// # async fn run() -> Result<(), sovra_core::VaultError> {
/// let vault = Vault::open(VaultConfig::new(), &StaticCredential::new(b"host key material".to_vec()))?;
/// let vault = AsyncVault::new(vault);
///
/// vault.write_bytes("inbox/1.eml", b"hello".to_vec()).await?;
/// assert_eq!(vault.read_bytes("inbox/1.eml").await?, b"hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AsyncVault {
    inner: Arc<Vault>,
}

impl AsyncVault {
    /// Wraps a vault.
    #[must_use]
    pub fn new(vault: Vault) -> Self {
        Self::from_arc(Arc::new(vault))
    }

    /// Wraps a vault that is shared with blocking callers.
    #[must_use]
    pub fn from_arc(inner: Arc<Vault>) -> Self {
        Self { inner }
    }

    /// Returns the underlying vault.
    #[must_use]
    pub fn vault(&self) -> &Arc<Vault> {
        &self.inner
    }

    async fn run<T, F>(&self, op: F) -> VaultResult<T>
    where
        F: FnOnce(&Vault) -> VaultResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let vault = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&vault))
            .await
            .map_err(join_error)?
    }

    /// See [`Vault::exists`].
    pub async fn exists(&self, path: impl Into<String>) -> bool {
        let path = path.into();
        self.run(move |vault| Ok(vault.exists(&path)))
            .await
            .unwrap_or(false)
    }

    /// See [`Vault::read_bytes`].
    pub async fn read_bytes(&self, path: impl Into<String>) -> VaultResult<Vec<u8>> {
        let path = path.into();
        self.run(move |vault| vault.read_bytes(&path)).await
    }

    /// See [`Vault::write_bytes`]. Cancelled if the future is dropped before
    /// the write commits.
    pub async fn write_bytes(&self, path: impl Into<String>, data: Vec<u8>) -> VaultResult<()> {
        let path = path.into();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let guard = cancel.drop_guard();

        let result = self
            .run(move |vault| vault.write_bytes_cancellable(&path, &data, &token))
            .await;
        guard.disarm();
        result
    }

    /// See [`Vault::delete_file`].
    pub async fn delete_file(&self, path: impl Into<String>) -> VaultResult<bool> {
        let path = path.into();
        self.run(move |vault| vault.delete_file(&path)).await
    }

    /// See [`Vault::list`].
    pub async fn list(&self, prefix: Option<String>) -> VaultResult<Vec<RelativePath>> {
        self.run(move |vault| vault.list(prefix.as_deref())).await
    }

    /// See [`Vault::health_check`].
    pub async fn health_check(&self) -> VaultResult<()> {
        self.run(Vault::health_check).await
    }
}

fn join_error(e: JoinError) -> VaultError {
    if e.is_panic() {
        std::panic::resume_unwind(e.into_panic());
    }
    VaultError::Io(io::Error::other(e))
}
