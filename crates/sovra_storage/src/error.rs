//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// Every variant names the path it concerns so callers can decide how to
/// react without parsing messages.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No file is stored at the path.
    #[error("not found: {path}")]
    NotFound {
        /// The requested path.
        path: String,
    },

    /// The ciphertext is corrupt, was moved from another path, or the key
    /// does not match.
    #[error("decryption failed for {path}: {reason}")]
    DecryptionFailed {
        /// The path whose content failed to open.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The device reported an error.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being accessed.
        path: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The platform refused the write because storage is full or a quota
    /// was hit.
    #[error("storage quota exceeded writing {path}: {source}")]
    QuotaExceeded {
        /// The path being written.
        path: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The path is not a valid relative path inside the store.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The write was cancelled before it was committed.
    #[error("write to {path} cancelled before commit")]
    Cancelled {
        /// The path that was being written.
        path: String,
    },

    /// Sealing plaintext failed.
    #[error("encryption failed: {0}")]
    Encryption(String),
}

impl StorageError {
    /// Creates a not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Wraps a device error, classifying storage exhaustion as
    /// [`QuotaExceeded`](Self::QuotaExceeded).
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if is_quota_error(&source) {
            Self::QuotaExceeded { path, source }
        } else {
            Self::Io { path, source }
        }
    }

    /// Returns true if retrying the same operation may succeed.
    ///
    /// Only device errors are transient; the store never retries on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[cfg(unix)]
const QUOTA_CODES: &[i32] = &[libc::ENOSPC, libc::EDQUOT];

// ERROR_HANDLE_DISK_FULL, ERROR_DISK_FULL
#[cfg(windows)]
const QUOTA_CODES: &[i32] = &[39, 112];

#[cfg(not(any(unix, windows)))]
const QUOTA_CODES: &[i32] = &[];

fn is_quota_error(e: &io::Error) -> bool {
    e.raw_os_error()
        .is_some_and(|code| QUOTA_CODES.contains(&code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_io_errors_are_transient() {
        let err = StorageError::io("a/b", io::Error::new(io::ErrorKind::Other, "disk hiccup"));
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(err.is_transient());
    }

    #[cfg(unix)]
    #[test]
    fn full_disk_is_quota_exceeded() {
        let err = StorageError::io("a", io::Error::from_raw_os_error(libc::ENOSPC));
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(!err.is_transient());

        let err = StorageError::io("a", io::Error::from_raw_os_error(libc::EDQUOT));
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }

    #[test]
    fn messages_carry_the_path() {
        let err = StorageError::decryption_failed("notes/today", "authentication failed");
        assert_eq!(
            err.to_string(),
            "decryption failed for notes/today: authentication failed"
        );
        assert!(!err.is_transient());
    }
}
