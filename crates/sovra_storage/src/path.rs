//! Validated relative paths.
//!
//! A [`RelativePath`] is the only way to address a stored file. Parsing is
//! where escapes from the store root are rejected, so no store operation
//! ever joins unchecked caller input onto a directory.

use crate::error::{StorageError, StorageResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of in-flight temporary files. Names starting with it are reserved.
pub const TEMP_PREFIX: &str = ".tmp-";

/// Prefix of health check files. Names starting with it are reserved.
pub const HEALTH_PREFIX: &str = ".health-";

/// Longest accepted component, in bytes. Leaves room for the temporary
/// name (`.tmp-<name>-<16 hex>`) within the common 255-byte limit.
pub const MAX_COMPONENT_LEN: usize = 200;

/// Names Windows refuses as file names regardless of extension.
const DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// A `/`-separated path that stays inside the store root on every platform.
///
/// # Rules
///
/// - not empty, no leading `/`, no empty components (`a//b`, `a/`)
/// - no `.` or `..` components
/// - no `\`, `:` or NUL anywhere
/// - no component starting with [`TEMP_PREFIX`] or [`HEALTH_PREFIX`]
/// - no component longer than [`MAX_COMPONENT_LEN`] bytes
/// - no component ending in `.` or space, no Windows device names
///
/// # Example
///
/// ```
/// use sovra_storage::RelativePath;
///
/// let path = RelativePath::new("models/embeddings.bin").unwrap();
/// assert_eq!(path.file_name(), "embeddings.bin");
/// assert!(RelativePath::new("../../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(String);

impl RelativePath {
    /// Parses and validates a relative path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] describing the first rule broken.
    pub fn new(path: impl AsRef<str>) -> StorageResult<Self> {
        let raw = path.as_ref();
        validate(raw).map_err(|reason| StorageError::invalid_path(raw, reason))?;
        Ok(Self(raw.to_string()))
    }

    /// The path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The first component.
    #[must_use]
    pub fn first_component(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// The last component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The path without its last component, if any.
    #[must_use]
    pub fn parent(&self) -> Option<RelativePath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// A fresh top-level health check path.
    ///
    /// The name is reserved: [`RelativePath::new`] rejects it, so callers can
    /// never address it and listings never show it.
    #[must_use]
    pub fn health_check() -> Self {
        Self(format!("{HEALTH_PREFIX}{:016x}", rand::random::<u64>()))
    }

    /// Returns true for store-internal names (temporaries and health checks).
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.components()
            .any(|c| c.starts_with(TEMP_PREFIX) || c.starts_with(HEALTH_PREFIX))
    }

    /// Appends a validated child path.
    pub fn join(&self, child: &str) -> StorageResult<Self> {
        Self::new(format!("{}/{child}", self.0))
    }

    /// Returns true if `prefix` is this path or one of its ancestors.
    #[must_use]
    pub fn starts_with(&self, prefix: &RelativePath) -> bool {
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0) && self.0.as_bytes().get(prefix.0.len()) == Some(&b'/'))
    }

    /// Resolves the path below `root` using the platform separator.
    #[must_use]
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.components());
        path
    }
}

fn validate(raw: &str) -> Result<(), &'static str> {
    if raw.is_empty() {
        return Err("empty path");
    }
    if raw.starts_with('/') {
        return Err("absolute path");
    }
    if raw.contains('\\') {
        return Err("backslash separator");
    }
    if raw.contains(':') {
        return Err("drive or stream separator");
    }
    if raw.contains('\0') {
        return Err("NUL byte");
    }

    for component in raw.split('/') {
        if component.is_empty() {
            return Err("empty component");
        }
        if component == "." || component == ".." {
            return Err("dot component");
        }
        if component.starts_with(TEMP_PREFIX) {
            return Err("reserved temporary name");
        }
        if component.starts_with(HEALTH_PREFIX) {
            return Err("reserved health check name");
        }
        if component.len() > MAX_COMPONENT_LEN {
            return Err("component too long");
        }
        if component.ends_with('.') || component.ends_with(' ') {
            return Err("trailing dot or space");
        }
        let stem = component.split('.').next().unwrap_or(component);
        if DEVICE_NAMES.iter().any(|d| d.eq_ignore_ascii_case(stem)) {
            return Err("device name");
        }
    }
    Ok(())
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for RelativePath {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
