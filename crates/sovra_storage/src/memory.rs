//! In-memory blob store for testing.

use crate::backend::BlobStore;
use crate::error::{StorageError, StorageResult};
use crate::path::RelativePath;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// An in-memory blob store.
///
/// This store keeps all blobs in a map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral vaults that don't need persistence
///
/// Every operation holds the map lock for its whole duration, which makes
/// writes trivially atomic.
///
/// # Example
///
/// ```rust
/// use sovra_storage::{BlobStore, MemoryStore, RelativePath};
///
/// let store = MemoryStore::new();
/// let path = RelativePath::new("k").unwrap();
/// store.write(&path, b"test data").unwrap();
/// assert_eq!(store.read(&path).unwrap(), b"test data");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<BTreeMap<RelativePath, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the raw bytes stored at `path`, bypassing any
    /// wrapper. Useful for inspecting ciphertext in tests.
    #[must_use]
    pub fn raw(&self, path: &RelativePath) -> Option<Vec<u8>> {
        self.blobs.read().get(path).cloned()
    }

    /// Replaces the raw bytes at `path` without any checks.
    ///
    /// Useful for simulating on-disk corruption.
    pub fn set_raw(&self, path: &RelativePath, data: Vec<u8>) {
        self.blobs.write().insert(path.clone(), data);
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn exists(&self, path: &RelativePath) -> bool {
        self.blobs.read().contains_key(path)
    }

    fn read(&self, path: &RelativePath) -> StorageResult<Vec<u8>> {
        self.blobs
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path.as_str()))
    }

    fn write_cancellable(
        &self,
        path: &RelativePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let mut blobs = self.blobs.write();
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled {
                path: path.to_string(),
            });
        }
        blobs.insert(path.clone(), data.to_vec());
        Ok(())
    }

    fn delete(&self, path: &RelativePath) -> StorageResult<bool> {
        Ok(self.blobs.write().remove(path).is_some())
    }

    fn list(&self, prefix: Option<&RelativePath>) -> StorageResult<Vec<RelativePath>> {
        let blobs = self.blobs.read();
        Ok(blobs
            .keys()
            .filter(|path| !path.is_internal())
            .filter(|path| prefix.map_or(true, |prefix| path.starts_with(prefix)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> RelativePath {
        RelativePath::new(raw).unwrap()
    }

    #[test]
    fn memory_write_read_delete() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.write(&p("a"), b"one").unwrap();
        assert!(store.exists(&p("a")));
        assert_eq!(store.read(&p("a")).unwrap(), b"one");
        assert_eq!(store.len(), 1);

        assert!(store.delete(&p("a")).unwrap());
        assert!(!store.delete(&p("a")).unwrap());
        assert!(matches!(store.read(&p("a")), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn memory_list_by_prefix() {
        let store = MemoryStore::new();
        for name in ["x/1", "x/2", "xy", "z"] {
            store.write(&p(name), b"").unwrap();
        }

        assert_eq!(store.list(Some(&p("x"))).unwrap(), vec![p("x/1"), p("x/2")]);
        assert_eq!(store.list(None).unwrap().len(), 4);
    }

    #[test]
    fn memory_cancelled_write() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = store.write_cancellable(&p("a"), b"x", &cancel);
        assert!(matches!(result, Err(StorageError::Cancelled { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn memory_list_hides_health_checks() {
        let store = MemoryStore::new();
        store.write(&RelativePath::health_check(), b"ok").unwrap();
        store.write(&p("visible"), b"").unwrap();

        assert_eq!(store.list(None).unwrap(), vec![p("visible")]);
        assert_eq!(store.len(), 2);
    }
}
