//! File-based blob store with crash-safe writes.

use crate::backend::BlobStore;
use crate::error::{StorageError, StorageResult};
use crate::lock::PathLocks;
use crate::path::{RelativePath, HEALTH_PREFIX, TEMP_PREFIX};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Attempts at finding an unused temporary name before giving up.
const TEMP_NAME_ATTEMPTS: usize = 8;

/// A blob store rooted at a directory.
///
/// Each blob is one file at `<root>/<relative path>`.
///
/// # Durability
///
/// `write` never modifies the target in place:
/// 1. Write to `<dir>/.tmp-<name>-<random>` next to the target
/// 2. Sync the temporary file to disk
/// 3. Rename it over the target
/// 4. Fsync the directory so the rename itself is durable
///
/// A crash before step 3 leaves the old content plus an orphaned temporary,
/// which [`sweep_temporaries`](Self::sweep_temporaries) removes on the next
/// start. A crash after step 3 leaves the new content.
///
/// # Thread Safety
///
/// Writes and deletes of the same path serialize on a per-path lock. Reads
/// take no lock: the rename swaps whole files, so a reader holding the old
/// file keeps reading the old content.
///
/// # Example
///
/// ```no_run
/// use sovra_storage::{BlobStore, FileStore, RelativePath};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("vault")).unwrap();
/// let path = RelativePath::new("notes/today.md").unwrap();
/// store.write(&path, b"remember the milk").unwrap();
/// assert_eq!(store.read(&path).unwrap(), b"remember the milk");
/// ```
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    locks: PathLocks,
    reserved: Vec<String>,
    sync: bool,
}

impl FileStore {
    /// Opens a store rooted at an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not an accessible directory.
    pub fn open(root: &Path) -> StorageResult<Self> {
        let meta = fs::metadata(root).map_err(|e| StorageError::io(root.display().to_string(), e))?;
        if !meta.is_dir() {
            return Err(StorageError::io(
                root.display().to_string(),
                io::Error::new(io::ErrorKind::InvalidInput, "store root is not a directory"),
            ));
        }

        Ok(Self {
            root: root.to_path_buf(),
            locks: PathLocks::new(),
            reserved: Vec::new(),
            sync: true,
        })
    }

    /// Reserves top-level names for the owner of the directory.
    ///
    /// Reserved names are invisible to `exists` and `list` and rejected by
    /// every other operation.
    #[must_use]
    pub fn with_reserved_names(mut self, names: &[&str]) -> Self {
        self.reserved = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    /// Sets whether writes are synced to disk before and after the rename.
    ///
    /// Disabling sync keeps atomicity against process crashes but not
    /// against power loss.
    #[must_use]
    pub const fn sync_writes(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of paths with a write or delete in progress.
    #[must_use]
    pub fn writes_in_flight(&self) -> usize {
        self.locks.active()
    }

    /// Removes temporaries orphaned by an interrupted write, and health
    /// check files orphaned by an interrupted check.
    ///
    /// Must only run while no write is in flight, i.e. before the store is
    /// shared. Returns the number of files removed.
    pub fn sweep_temporaries(&self) -> StorageResult<usize> {
        let mut removed = 0;
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let entries =
                fs::read_dir(&dir).map_err(|e| StorageError::io(dir.display().to_string(), e))?;
            for entry in entries {
                let entry = entry.map_err(|e| StorageError::io(dir.display().to_string(), e))?;
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .map_err(|e| StorageError::io(path.display().to_string(), e))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if is_leftover(&entry.file_name().to_string_lossy()) {
                    fs::remove_file(&path)
                        .map_err(|e| StorageError::io(path.display().to_string(), e))?;
                    tracing::warn!(path = %path.display(), "removed leftover of an interrupted operation");
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }

    fn is_reserved(&self, path: &RelativePath) -> bool {
        // Case-insensitive file systems would alias `lock` to `LOCK`.
        let first = path.first_component();
        self.reserved.iter().any(|r| r.eq_ignore_ascii_case(first))
    }

    fn check_reserved(&self, path: &RelativePath) -> StorageResult<()> {
        if self.is_reserved(path) {
            return Err(StorageError::invalid_path(path.as_str(), "reserved name"));
        }
        Ok(())
    }

    fn sync_dir(&self, dir: &Path) -> io::Result<()> {
        if self.sync {
            sync_directory(dir)?;
        }
        Ok(())
    }

    fn collect(&self, dir: &Path, prefix: &str, out: &mut Vec<RelativePath>) -> StorageResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::io(dir.display().to_string(), e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(dir.display().to_string(), e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            // Temporaries, foreign names and reserved entries are skipped.
            let Ok(path) = RelativePath::new(&relative) else {
                continue;
            };
            if self.is_reserved(&path) {
                continue;
            }

            let file_type = entry
                .file_type()
                .map_err(|e| StorageError::io(relative.clone(), e))?;
            if file_type.is_dir() {
                self.collect(&entry.path(), &relative, out)?;
            } else if file_type.is_file() {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl BlobStore for FileStore {
    fn exists(&self, path: &RelativePath) -> bool {
        if self.is_reserved(path) {
            return false;
        }
        fs::metadata(path.to_path(&self.root))
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    fn read(&self, path: &RelativePath) -> StorageResult<Vec<u8>> {
        self.check_reserved(path)?;
        let target = path.to_path(&self.root);

        match fs::read(&target) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::not_found(path.as_str())),
            Err(_) if target.is_dir() => Err(StorageError::not_found(path.as_str())),
            Err(e) => Err(StorageError::io(path.as_str(), e)),
        }
    }

    fn write_cancellable(
        &self,
        path: &RelativePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.check_reserved(path)?;
        let target = path.to_path(&self.root);
        let parent = target.parent().unwrap_or(&self.root).to_path_buf();
        let io_err = |e| StorageError::io(path.as_str(), e);

        let _guard = self.locks.lock(path.as_str());
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled {
                path: path.to_string(),
            });
        }

        fs::create_dir_all(&parent).map_err(io_err)?;

        let mut temp = TempFile::create(&parent, path.file_name()).map_err(io_err)?;
        let file = temp.file().map_err(io_err)?;
        file.write_all(data).map_err(io_err)?;
        if self.sync {
            file.sync_all().map_err(io_err)?;
        }

        // Last point at which the write can be abandoned; dropping `temp`
        // removes the temporary file.
        if cancel.is_cancelled() {
            tracing::debug!(path = %path, "write cancelled before commit");
            return Err(StorageError::Cancelled {
                path: path.to_string(),
            });
        }

        temp.commit(&target).map_err(io_err)?;
        self.sync_dir(&parent).map_err(io_err)?;

        tracing::debug!(path = %path, bytes = data.len(), "wrote file");
        Ok(())
    }

    fn delete(&self, path: &RelativePath) -> StorageResult<bool> {
        self.check_reserved(path)?;
        let target = path.to_path(&self.root);

        let _guard = self.locks.lock(path.as_str());
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(_) if target.is_dir() => return Ok(false),
            Err(e) => return Err(StorageError::io(path.as_str(), e)),
        }

        if let Some(parent) = target.parent() {
            self.sync_dir(parent)
                .map_err(|e| StorageError::io(path.as_str(), e))?;
        }
        tracing::debug!(path = %path, "deleted file");
        Ok(true)
    }

    fn list(&self, prefix: Option<&RelativePath>) -> StorageResult<Vec<RelativePath>> {
        let mut out = Vec::new();
        match prefix {
            Some(prefix) => {
                if self.is_reserved(prefix) {
                    return Ok(out);
                }
                let target = prefix.to_path(&self.root);
                if target.is_file() {
                    out.push(prefix.clone());
                } else {
                    self.collect(&target, prefix.as_str(), &mut out)?;
                }
            }
            None => self.collect(&self.root, "", &mut out)?,
        }
        out.sort();
        Ok(out)
    }
}

fn is_leftover(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) || name.starts_with(HEALTH_PREFIX)
}

/// A temporary file that is removed on drop unless committed.
struct TempFile {
    path: PathBuf,
    file: Option<File>,
}

impl TempFile {
    fn create(dir: &Path, target_name: &str) -> io::Result<Self> {
        let mut last_err = None;
        for _ in 0..TEMP_NAME_ATTEMPTS {
            let path = dir.join(format!("{TEMP_PREFIX}{target_name}-{:016x}", rand::random::<u64>()));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(Self {
                        path,
                        file: Some(file),
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::AlreadyExists, "no free temporary name")))
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "temporary file already closed"))
    }

    /// Renames the temporary over `target`, consuming the guard.
    fn commit(mut self, target: &Path) -> io::Result<()> {
        // Close before renaming; Windows refuses to rename open files.
        drop(self.file.take());
        fs::rename(&self.path, target)?;
        self.path = PathBuf::new();
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.path.as_os_str().is_empty() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temporary file");
            }
        }
    }
}

/// Syncs a directory so that entries created, renamed or removed in it are
/// durable.
#[cfg(unix)]
fn sync_directory(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> io::Result<()> {
    // NTFS journals metadata; directories cannot be opened for fsync
    Ok(())
}
