//! Encrypted blob store wrapper.
//!
//! Wraps another [`BlobStore`] and seals every blob with an [`Envelope`]
//! before it reaches the inner store. Each blob is bound to its path, so
//! ciphertext copied or renamed underneath the store refuses to open.

use crate::backend::BlobStore;
use crate::envelope::Envelope;
use crate::error::{StorageError, StorageResult};
use crate::path::RelativePath;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A blob store that encrypts content at rest.
///
/// # Example
///
/// ```rust
/// use sovra_storage::{BlobStore, EncryptedStore, EncryptionKey, Envelope, MemoryStore, RelativePath};
///
/// let envelope = Envelope::new(EncryptionKey::generate());
/// let store = EncryptedStore::new(MemoryStore::new(), envelope);
/// let path = RelativePath::new("secret.txt").unwrap();
///
/// store.write(&path, b"secret data").unwrap();
/// assert_eq!(store.read(&path).unwrap(), b"secret data");
/// assert_ne!(store.inner().raw(&path).unwrap(), b"secret data");
/// ```
#[derive(Debug)]
pub struct EncryptedStore<S: BlobStore> {
    inner: S,
    envelope: Arc<Envelope>,
}

impl<S: BlobStore> EncryptedStore<S> {
    /// Wraps `inner`, sealing with `envelope`.
    pub fn new(inner: S, envelope: Envelope) -> Self {
        Self::with_shared(inner, Arc::new(envelope))
    }

    /// Wraps `inner` with an envelope shared with other stores.
    pub fn with_shared(inner: S, envelope: Arc<Envelope>) -> Self {
        Self { inner, envelope }
    }

    /// Returns a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns the envelope used for sealing.
    pub fn envelope(&self) -> &Arc<Envelope> {
        &self.envelope
    }
}

impl<S: BlobStore> BlobStore for EncryptedStore<S> {
    fn exists(&self, path: &RelativePath) -> bool {
        self.inner.exists(path)
    }

    fn read(&self, path: &RelativePath) -> StorageResult<Vec<u8>> {
        let sealed = self.inner.read(path)?;
        self.envelope.open(path.as_str(), &sealed)
    }

    fn write_cancellable(
        &self,
        path: &RelativePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled {
                path: path.to_string(),
            });
        }
        let sealed = self.envelope.seal(path.as_str(), data)?;
        self.inner.write_cancellable(path, &sealed, cancel)
    }

    fn delete(&self, path: &RelativePath) -> StorageResult<bool> {
        self.inner.delete(path)
    }

    fn list(&self, prefix: Option<&RelativePath>) -> StorageResult<Vec<RelativePath>> {
        self.inner.list(prefix)
    }
}
