//! Vault directory management.
//!
//! This module handles the file system layout of a vault:
//!
//! ```text
//! <private data directory>/
//! ├─ LOCK              # Advisory lock for single-process access
//! ├─ MANIFEST          # Format version, vault id, KDF salt, key check
//! └─ <relative path>   # Encrypted content, one file per stored path
//! ```
//!
//! The LOCK file ensures only one vault instance serves a directory at a
//! time. Both names are reserved and invisible through the vault API.

use crate::error::{VaultError, VaultResult};
use crate::manifest::Manifest;
use fs2::FileExt;
use sovra_storage::TEMP_PREFIX;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Name of the manifest file.
pub const MANIFEST_FILE: &str = "MANIFEST";
/// Name of the lock file.
pub const LOCK_FILE: &str = "LOCK";
/// Top-level names the content store must not touch.
pub const RESERVED_NAMES: &[&str] = &[MANIFEST_FILE, LOCK_FILE];

/// Holds the exclusive lock on a private data directory.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct VaultDir {
    path: PathBuf,
    _lock_file: File,
}

impl VaultDir {
    /// Locks an existing private data directory.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Locked`] if another vault holds the lock
    /// - [`VaultError::Io`] if the lock file cannot be opened
    pub fn open(path: &Path) -> VaultResult<Self> {
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(VaultError::Locked {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the private data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the MANIFEST file.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    /// Loads the manifest.
    ///
    /// Returns `None` if the vault has never been initialized.
    pub fn load_manifest(&self) -> VaultResult<Option<Manifest>> {
        match fs::read(self.manifest_path()) {
            Ok(data) => Manifest::decode(&data).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Saves the manifest atomically.
    ///
    /// Uses the write-then-rename pattern:
    /// 1. Write to a temporary file
    /// 2. Sync it to disk
    /// 3. Rename it over MANIFEST
    /// 4. Fsync the directory so the rename is durable
    pub fn save_manifest(&self, manifest: &Manifest) -> VaultResult<()> {
        let data = manifest.encode()?;
        let temp_path = self.path.join(format!("{TEMP_PREFIX}{MANIFEST_FILE}"));

        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.manifest_path())?;
        self.sync_directory()?;
        Ok(())
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> VaultResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> VaultResult<()> {
        Ok(())
    }
}

/// Removes everything inside `dir`, keeping the directory itself.
///
/// Returns the number of top-level entries removed.
pub fn clear_directory(dir: &Path) -> VaultResult<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
        removed += 1;
    }
    Ok(removed)
}
