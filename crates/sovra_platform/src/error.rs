//! Error types for platform operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors that can occur while resolving platform directories.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The directory cannot be determined, created or accessed.
    #[error("directory unavailable: {}: {reason}", path.display())]
    DirectoryUnavailable {
        /// The directory that was requested (may be empty if no base exists).
        path: PathBuf,
        /// Why the directory is unavailable.
        reason: String,
    },

    /// The application name cannot be used as a directory name.
    #[error("invalid application name: {name:?}")]
    InvalidAppName {
        /// The rejected name.
        name: String,
    },
}

impl PlatformError {
    /// Creates a directory unavailable error.
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
