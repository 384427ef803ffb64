//! Blob store trait definition.

use crate::error::StorageResult;
use crate::path::RelativePath;
use tokio_util::sync::CancellationToken;

/// A store of whole blobs addressed by [`RelativePath`].
///
/// Blob stores are **opaque byte stores**: they never interpret content.
/// Encryption is layered on top by [`crate::EncryptedStore`].
///
/// # Invariants
///
/// - `write` is all-or-nothing: a reader sees the complete previous content
///   or the complete new content, never a mix or a prefix
/// - `write` fully supersedes previous content (no partial updates)
/// - writes and deletes of the same path are serialized
/// - a cancelled write that has not committed leaves no trace
/// - stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`crate::FileStore`] - durable storage using write-then-rename
/// - [`crate::MemoryStore`] - for testing and ephemeral vaults
/// - [`crate::EncryptedStore`] - AES-256-GCM wrapper around another store
pub trait BlobStore: Send + Sync {
    /// Returns true if a blob is stored at `path`.
    ///
    /// Never fails: device errors read as `false`.
    fn exists(&self, path: &RelativePath) -> bool;

    /// Reads the complete blob at `path`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`](crate::StorageError::NotFound) if absent
    /// - [`StorageError::Io`](crate::StorageError::Io) on device failure
    fn read(&self, path: &RelativePath) -> StorageResult<Vec<u8>>;

    /// Atomically replaces the blob at `path`, honouring `cancel` until the
    /// commit point.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Cancelled`](crate::StorageError::Cancelled) if
    ///   `cancel` fired before commit
    /// - [`StorageError::QuotaExceeded`](crate::StorageError::QuotaExceeded)
    ///   if the device is full
    /// - [`StorageError::Io`](crate::StorageError::Io) on device failure
    fn write_cancellable(
        &self,
        path: &RelativePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Removes the blob at `path`.
    ///
    /// Returns `false` (not an error) if nothing was stored there.
    fn delete(&self, path: &RelativePath) -> StorageResult<bool>;

    /// Lists stored blobs, optionally restricted to those under `prefix`.
    ///
    /// The result is sorted.
    fn list(&self, prefix: Option<&RelativePath>) -> StorageResult<Vec<RelativePath>>;

    /// Atomically replaces the blob at `path`.
    fn write(&self, path: &RelativePath, data: &[u8]) -> StorageResult<()> {
        self.write_cancellable(path, data, &CancellationToken::new())
    }
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn exists(&self, path: &RelativePath) -> bool {
        (**self).exists(path)
    }

    fn read(&self, path: &RelativePath) -> StorageResult<Vec<u8>> {
        (**self).read(path)
    }

    fn write_cancellable(
        &self,
        path: &RelativePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        (**self).write_cancellable(path, data, cancel)
    }

    fn delete(&self, path: &RelativePath) -> StorageResult<bool> {
        (**self).delete(path)
    }

    fn list(&self, prefix: Option<&RelativePath>) -> StorageResult<Vec<RelativePath>> {
        (**self).list(prefix)
    }
}
