//! Crash recovery testing for Sovra.
//!
//! A killed process can leave the data directory in a handful of states.
//! This module reproduces each of them on disk and checks that a reopened
//! vault serves either the previous or the new content, never a mix, and
//! that recovery removes every temporary.
//!
//! ## Test Strategy
//!
//! 1. **Crash during the temporary write** - a truncated temporary is left
//! 2. **Crash before the rename** - a complete temporary is left
//! 3. **Crash after the rename** - the new content is committed
//!
//! ## Usage
//!
//! ```rust
//! use sovra_testkit::crash::CrashRecoveryHarness;
//!
//! let results = CrashRecoveryHarness::new().run_all();
//! assert!(results.iter().all(|r| r.passed), "{results:#?}");
//! ```

use crate::fixtures::TestVault;
use sovra_storage::{BlobStore, CancellationToken, RelativePath, StorageError, StorageResult, TEMP_PREFIX};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Points at which a crash can be simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// Crash while the temporary is being written (partial temporary).
    DuringTempWrite,
    /// Crash after the temporary is complete but before the rename.
    BeforeRename,
    /// Crash after the rename, before the directory sync.
    AfterRename,
}

impl CrashPoint {
    /// All crash points.
    pub const ALL: [CrashPoint; 3] = [
        CrashPoint::DuringTempWrite,
        CrashPoint::BeforeRename,
        CrashPoint::AfterRename,
    ];
}

/// Result of a crash recovery test.
#[derive(Debug, Clone)]
pub struct CrashRecoveryResult {
    /// The crash point exercised.
    pub point: CrashPoint,
    /// Whether the test passed.
    pub passed: bool,
    /// Any error message.
    pub error: Option<String>,
}

impl CrashRecoveryResult {
    fn pass(point: CrashPoint) -> Self {
        Self {
            point,
            passed: true,
            error: None,
        }
    }

    fn fail(point: CrashPoint, error: impl Into<String>) -> Self {
        Self {
            point,
            passed: false,
            error: Some(error.into()),
        }
    }
}

/// Leaves a temporary next to `path` as an interrupted write would.
///
/// Returns the temporary's location.
pub fn leave_temporary(data_dir: &Path, path: &str, content: &[u8]) -> io::Result<PathBuf> {
    let target = data_dir.join(path);
    let parent = target.parent().unwrap_or(data_dir);
    fs::create_dir_all(parent)?;
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!("{TEMP_PREFIX}{name}-00000000c0ffee00"));
    fs::write(&temp, content)?;
    Ok(temp)
}

/// Lists temporaries anywhere under `dir`.
pub fn find_temporaries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                pending.push(entry.path());
            } else if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
                found.push(entry.path());
            }
        }
    }
    Ok(found)
}

/// Test harness for crash recovery scenarios.
#[derive(Debug, Default)]
pub struct CrashRecoveryHarness {
    /// Results of crash recovery tests.
    pub results: Vec<CrashRecoveryResult>,
}

const OLD: &[u8] = b"committed before the crash";
const NEW: &[u8] = b"written while the process was killed";
const TARGET: &str = "docs/report.txt";

impl CrashRecoveryHarness {
    /// Creates a new harness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every crash point and returns the results.
    pub fn run_all(mut self) -> Vec<CrashRecoveryResult> {
        for point in CrashPoint::ALL {
            let result = self.run(point);
            self.results.push(result);
        }
        self.results
    }

    /// Simulates a crash at `point` and checks recovery.
    pub fn run(&self, point: CrashPoint) -> CrashRecoveryResult {
        match Self::scenario(point) {
            Ok(()) => CrashRecoveryResult::pass(point),
            Err(e) => CrashRecoveryResult::fail(point, e),
        }
    }

    fn scenario(point: CrashPoint) -> Result<(), String> {
        let vault = TestVault::new();
        vault.write_bytes(TARGET, OLD).map_err(|e| e.to_string())?;
        let committed = fs::read(vault.data_dir().join(TARGET)).map_err(|e| e.to_string())?;

        let expected = match point {
            CrashPoint::DuringTempWrite => {
                let partial = &committed[..committed.len() / 2];
                leave_temporary(&vault.data_dir(), TARGET, partial).map_err(|e| e.to_string())?;
                OLD
            }
            CrashPoint::BeforeRename => {
                leave_temporary(&vault.data_dir(), TARGET, &committed).map_err(|e| e.to_string())?;
                OLD
            }
            CrashPoint::AfterRename => {
                vault.write_bytes(TARGET, NEW).map_err(|e| e.to_string())?;
                NEW
            }
        };

        // Before recovery, readers already see complete content.
        let before = vault.read_bytes(TARGET).map_err(|e| e.to_string())?;
        if before != expected {
            return Err(format!("{point:?}: wrong content before reopen"));
        }

        let vault = vault.reopen();
        let after = vault.read_bytes(TARGET).map_err(|e| e.to_string())?;
        if after != expected {
            return Err(format!("{point:?}: wrong content after reopen"));
        }
        let leftovers = find_temporaries(&vault.data_dir()).map_err(|e| e.to_string())?;
        if !leftovers.is_empty() {
            return Err(format!("{point:?}: temporaries survived recovery: {leftovers:?}"));
        }
        Ok(())
    }
}

/// A blob store wrapper that can simulate device failures.
pub struct CrashableStore<S: BlobStore> {
    inner: S,
    fail_after_writes: AtomicUsize,
    writes: AtomicUsize,
    crashed: AtomicBool,
}

impl<S: BlobStore> CrashableStore<S> {
    /// Creates a new crashable store wrapping an inner store.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_after_writes: AtomicUsize::new(usize::MAX),
            writes: AtomicUsize::new(0),
            crashed: AtomicBool::new(false),
        }
    }

    /// Makes every write after the first `writes` successful ones fail.
    pub fn fail_after(&self, writes: usize) {
        self.fail_after_writes.store(writes, Ordering::SeqCst);
    }

    /// Resets the crash state.
    pub fn reset(&self) {
        self.fail_after_writes.store(usize::MAX, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
        self.crashed.store(false, Ordering::SeqCst);
    }

    /// Returns whether a simulated failure has happened.
    pub fn has_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }

    /// Returns a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: BlobStore> BlobStore for CrashableStore<S> {
    fn exists(&self, path: &RelativePath) -> bool {
        self.inner.exists(path)
    }

    fn read(&self, path: &RelativePath) -> StorageResult<Vec<u8>> {
        self.inner.read(path)
    }

    fn write_cancellable(
        &self,
        path: &RelativePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let done = self.writes.fetch_add(1, Ordering::SeqCst);
        if done >= self.fail_after_writes.load(Ordering::SeqCst) {
            self.crashed.store(true, Ordering::SeqCst);
            return Err(StorageError::io(
                path.as_str(),
                io::Error::other("simulated device failure"),
            ));
        }
        self.inner.write_cancellable(path, data, cancel)
    }

    fn delete(&self, path: &RelativePath) -> StorageResult<bool> {
        self.inner.delete(path)
    }

    fn list(&self, prefix: Option<&RelativePath>) -> StorageResult<Vec<RelativePath>> {
        self.inner.list(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sovra_storage::{EncryptedStore, EncryptionKey, Envelope, MemoryStore};

    #[test]
    fn every_crash_point_recovers() {
        for result in CrashRecoveryHarness::new().run_all() {
            assert!(result.passed, "{:?}: {:?}", result.point, result.error);
        }
    }

    #[test]
    fn failed_write_keeps_previous_content() {
        let store = EncryptedStore::new(
            CrashableStore::new(MemoryStore::new()),
            Envelope::new(EncryptionKey::generate()),
        );
        let path = RelativePath::new("a").unwrap();
        store.write(&path, b"first").unwrap();

        store.inner().fail_after(1);
        let err = store.write(&path, b"second").unwrap_err();
        assert!(err.is_transient());
        assert!(store.inner().has_crashed());
        assert_eq!(store.read(&path).unwrap(), b"first");

        store.inner().reset();
        store.write(&path, b"second").unwrap();
        assert_eq!(store.read(&path).unwrap(), b"second");
    }
}
