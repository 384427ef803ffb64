//! Error types for the vault.

use sovra_platform::PlatformError;
use sovra_storage::StorageError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors that can occur in vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Directory resolution failed.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error outside a stored file (lock file, temp workspace).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The vault has not been initialized yet.
    #[error("vault not initialized")]
    NotInitialized,

    /// The vault has been closed.
    #[error("vault closed")]
    Closed,

    /// Another vault holds the directory lock.
    #[error("vault locked: another process has exclusive access to {}", path.display())]
    Locked {
        /// The locked private data directory.
        path: PathBuf,
    },

    /// The supplied key material does not open this vault.
    #[error("key mismatch: the credential does not open this vault")]
    KeyMismatch,

    /// The credential source could not supply key material.
    #[error("credential error: {message}")]
    Credential {
        /// Description of the failure.
        message: String,
    },

    /// The manifest is missing fields, corrupt, or from a newer format.
    #[error("invalid manifest: {message}")]
    InvalidManifest {
        /// Description of the issue.
        message: String,
    },
}

/// Coarse classification of a [`VaultError`].
///
/// Lets callers react to a failure without matching on nested error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No private or scratch directory could be determined or created.
    DirectoryUnavailable,
    /// No file is stored at the path.
    NotFound,
    /// Stored content failed authentication, or the key does not match.
    DecryptionFailed,
    /// The device reported an error; retrying may succeed.
    Io,
    /// Storage is full or a quota was hit.
    QuotaExceeded,
    /// The path is not a valid relative path inside the vault.
    InvalidPath,
    /// A write was cancelled before it was committed.
    Cancelled,
    /// The vault is not initialized, closed, or locked by another process.
    NotReady,
    /// The credential source failed.
    Credential,
}

impl VaultError {
    /// Creates a credential error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    /// Creates an invalid manifest error.
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Platform(_) => ErrorKind::DirectoryUnavailable,
            Self::Storage(e) => match e {
                StorageError::NotFound { .. } => ErrorKind::NotFound,
                StorageError::DecryptionFailed { .. } | StorageError::Encryption(_) => {
                    ErrorKind::DecryptionFailed
                }
                StorageError::Io { .. } => ErrorKind::Io,
                StorageError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
                StorageError::InvalidPath { .. } => ErrorKind::InvalidPath,
                StorageError::Cancelled { .. } => ErrorKind::Cancelled,
            },
            Self::Io(_) => ErrorKind::Io,
            Self::NotInitialized | Self::Closed | Self::Locked { .. } => ErrorKind::NotReady,
            Self::KeyMismatch => ErrorKind::DecryptionFailed,
            Self::Credential { .. } => ErrorKind::Credential,
            Self::InvalidManifest { .. } => ErrorKind::DecryptionFailed,
        }
    }

    /// Returns true if retrying the same operation may succeed.
    ///
    /// Only device errors qualify. The vault never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Io
    }
}
