//! Private data and scratch directory resolution.
//!
//! ```text
//! <private data directory>/      # per-platform convention or override
//! <temp workspace directory>/    # scratch, cleared by the vault on startup
//! ```
//!
//! Both directories are created on demand. They must be distinct and neither
//! may contain the other.

use crate::error::{PlatformError, PlatformResult};
use crate::platform::{Platform, PlatformInfo, PlatformKind};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable lookup used by platform conventions.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<OsString>;

type SharedEnv = Arc<dyn Fn(&str) -> Option<OsString> + Send + Sync>;

/// The pair of directories a vault works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDirs {
    /// Root of the private data tree.
    pub private_data: PathBuf,
    /// Scratch workspace.
    pub temp_workspace: PathBuf,
}

/// Resolves and creates the vault directories for one application.
///
/// # Example
///
/// ```
/// use sovra_platform::PathResolver;
///
/// let root = std::env::temp_dir().join("sovra-doc-example");
/// let resolver = PathResolver::new("doc-example")
///     .with_data_dir(root.join("data"))
///     .with_temp_dir(root.join("tmp"));
/// let dirs = resolver.resolve().unwrap();
/// assert!(dirs.private_data.is_dir());
/// # std::fs::remove_dir_all(root).unwrap();
/// ```
#[derive(Clone)]
pub struct PathResolver {
    app_name: String,
    platform: &'static dyn Platform,
    data_dir: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    env: SharedEnv,
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathResolver")
            .field("app_name", &self.app_name)
            .field("platform", &self.platform.kind())
            .field("data_dir", &self.data_dir)
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}

impl PathResolver {
    /// Creates a resolver for `app_name` using the native platform and the
    /// process environment.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            platform: <dyn Platform>::native(),
            data_dir: None,
            temp_dir: None,
            env: Arc::new(|name: &str| std::env::var_os(name)),
        }
    }

    /// Uses the conventions of another platform.
    #[must_use]
    pub fn with_platform(mut self, kind: PlatformKind) -> Self {
        self.platform = <dyn Platform>::for_kind(kind);
        self
    }

    /// Overrides the private data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Overrides the scratch directory.
    #[must_use]
    pub fn with_temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    /// Replaces the environment lookup (useful for testing).
    #[must_use]
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<OsString> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    /// Descriptor of the platform whose conventions are applied.
    #[must_use]
    pub fn platform(&self) -> PlatformInfo {
        self.platform.info()
    }

    /// Application name used as the directory leaf.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Returns the private data directory, creating it if absent.
    ///
    /// The returned path is canonical.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DirectoryUnavailable`] if no location can be
    /// determined or the directory cannot be created.
    pub fn private_data_directory(&self) -> PlatformResult<PathBuf> {
        let path = self.private_data_location()?;
        ensure_dir(&path, true)?;
        canonical(&path)
    }

    /// Returns the scratch workspace directory, creating it if absent.
    ///
    /// The returned path is canonical and never overlaps the private data
    /// directory.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`resolve`](Self::resolve).
    pub fn temp_workspace_directory(&self) -> PlatformResult<PathBuf> {
        Ok(self.resolve()?.temp_workspace)
    }

    /// Resolves and creates both directories, checking they do not overlap.
    ///
    /// Both paths are returned in canonical form, so `..` components and
    /// symlinks cannot make the scratch directory alias the private data.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DirectoryUnavailable`] if either directory
    /// cannot be determined or created, or if one contains the other.
    pub fn resolve(&self) -> PlatformResult<ResolvedDirs> {
        let private_data = self.private_data_location()?;
        let temp_workspace = self.temp_location(&private_data)?;

        // Nothing is created for a layout that overlaps as written.
        check_disjoint(&private_data, &temp_workspace)?;

        ensure_dir(&private_data, true)?;
        ensure_dir(&temp_workspace, false)?;

        let private_data = canonical(&private_data)?;
        let temp_workspace = canonical(&temp_workspace)?;
        check_disjoint(&private_data, &temp_workspace)?;

        tracing::debug!(
            platform = %self.platform.kind(),
            private_data = %private_data.display(),
            temp_workspace = %temp_workspace.display(),
            "resolved vault directories"
        );

        Ok(ResolvedDirs {
            private_data,
            temp_workspace,
        })
    }

    fn check_app_name(&self) -> PlatformResult<()> {
        let name = &self.app_name;
        let bad = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', ':', '\0']);
        if bad {
            return Err(PlatformError::InvalidAppName { name: name.clone() });
        }
        Ok(())
    }

    fn private_data_location(&self) -> PlatformResult<PathBuf> {
        if let Some(path) = &self.data_dir {
            return Ok(path.clone());
        }
        self.check_app_name()?;
        self.platform
            .default_data_dir(&self.app_name, &*self.env)
            .ok_or_else(|| {
                PlatformError::unavailable(
                    PathBuf::new(),
                    format!(
                        "{} exposes no private data location; configure one explicitly",
                        self.platform.kind()
                    ),
                )
            })
    }

    fn temp_location(&self, data: &Path) -> PlatformResult<PathBuf> {
        if let Some(path) = &self.temp_dir {
            return Ok(path.clone());
        }
        self.check_app_name()?;
        self.platform
            .default_temp_dir(&self.app_name, data, &*self.env)
            .ok_or_else(|| {
                PlatformError::unavailable(
                    PathBuf::new(),
                    format!("{} exposes no scratch location", self.platform.kind()),
                )
            })
    }
}

fn check_disjoint(private_data: &Path, temp_workspace: &Path) -> PlatformResult<()> {
    if private_data.starts_with(temp_workspace) || temp_workspace.starts_with(private_data) {
        return Err(PlatformError::unavailable(
            temp_workspace,
            format!(
                "temp workspace overlaps private data directory {}",
                private_data.display()
            ),
        ));
    }
    Ok(())
}

fn canonical(path: &Path) -> PlatformResult<PathBuf> {
    fs::canonicalize(path).map_err(|e| PlatformError::unavailable(path, e.to_string()))
}

/// Creates `path` if needed and checks it is a usable directory.
fn ensure_dir(path: &Path, private: bool) -> PlatformResult<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(PlatformError::unavailable(path, "exists and is not a directory"));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(PlatformError::unavailable(path, e.to_string())),
    }

    create_dir(path, private).map_err(|e| PlatformError::unavailable(path, e.to_string()))?;
    tracing::info!(path = %path.display(), "created directory");
    Ok(())
}

#[cfg(unix)]
fn create_dir(path: &Path, private: bool) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    if private {
        builder.mode(0o700);
    }
    builder.create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path, _private: bool) -> std::io::Result<()> {
    // Windows ACLs under %LOCALAPPDATA% are already per-user
    fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn overrides_are_created() {
        let temp = tempdir().unwrap();
        let resolver = PathResolver::new("app")
            .with_data_dir(temp.path().join("data"))
            .with_temp_dir(temp.path().join("scratch"));

        let dirs = resolver.resolve().unwrap();
        assert_eq!(dirs.private_data, fs::canonicalize(temp.path().join("data")).unwrap());
        assert_eq!(dirs.temp_workspace, fs::canonicalize(temp.path().join("scratch")).unwrap());
        assert!(dirs.private_data.is_dir());
        assert!(dirs.temp_workspace.is_dir());
    }

    #[test]
    fn resolution_is_stable() {
        let temp = tempdir().unwrap();
        let resolver = PathResolver::new("app")
            .with_data_dir(temp.path().join("data"))
            .with_temp_dir(temp.path().join("scratch"));

        let first = resolver.resolve().unwrap();
        let second = resolver.resolve().unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.private_data_directory().unwrap(), first.private_data);
        assert_eq!(resolver.temp_workspace_directory().unwrap(), first.temp_workspace);
    }

    #[test]
    fn conventions_come_from_env() {
        let temp = tempdir().unwrap();
        let home = temp.path().to_path_buf();
        let home_for_env = home.clone();
        let resolver = PathResolver::new("app")
            .with_platform(PlatformKind::Linux)
            .with_env(move |name| (name == "HOME").then(|| home_for_env.clone().into_os_string()));

        let dirs = resolver.resolve().unwrap();
        let home = fs::canonicalize(home).unwrap();
        assert_eq!(dirs.private_data, home.join(".local/share/app"));
        assert_eq!(dirs.temp_workspace, home.join(".cache/app/tmp"));
        assert_ne!(dirs.private_data, dirs.temp_workspace);
    }

    #[test]
    fn missing_convention_is_unavailable() {
        let resolver = PathResolver::new("app")
            .with_platform(PlatformKind::Android)
            .with_env(|_| None);

        let err = resolver.private_data_directory().unwrap_err();
        assert!(matches!(err, PlatformError::DirectoryUnavailable { .. }));
    }

    #[test]
    fn file_in_the_way_is_unavailable() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("data");
        fs::write(&blocker, b"not a directory").unwrap();

        let resolver = PathResolver::new("app").with_data_dir(&blocker);
        let err = resolver.private_data_directory().unwrap_err();
        assert!(matches!(err, PlatformError::DirectoryUnavailable { .. }));
    }

    #[test]
    fn overlapping_directories_are_rejected() {
        let temp = tempdir().unwrap();
        let resolver = PathResolver::new("app")
            .with_data_dir(temp.path().join("data"))
            .with_temp_dir(temp.path().join("data").join("tmp"));

        let err = resolver.resolve().unwrap_err();
        assert!(matches!(err, PlatformError::DirectoryUnavailable { .. }));
    }

    #[test]
    fn overlapping_directories_are_not_created() {
        let temp = tempdir().unwrap();
        let resolver = PathResolver::new("app")
            .with_data_dir(temp.path().join("data"))
            .with_temp_dir(temp.path().join("data").join("tmp"));

        assert!(resolver.temp_workspace_directory().is_err());
        assert!(!temp.path().join("data").exists());
    }

    #[test]
    fn dot_dot_alias_of_private_data_is_rejected() {
        let temp = tempdir().unwrap();
        let data = temp.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("precious"), b"keep me").unwrap();

        let resolver = PathResolver::new("app")
            .with_data_dir(&data)
            .with_temp_dir(temp.path().join("scratch").join("..").join("data"));

        let err = resolver.resolve().unwrap_err();
        assert!(matches!(err, PlatformError::DirectoryUnavailable { .. }));
        assert!(resolver.temp_workspace_directory().is_err());
        assert_eq!(fs::read(data.join("precious")).unwrap(), b"keep me");
    }

    #[test]
    fn dot_dot_into_private_data_is_rejected() {
        let temp = tempdir().unwrap();
        let resolver = PathResolver::new("app")
            .with_data_dir(temp.path().join("data"))
            .with_temp_dir(temp.path().join("scratch").join("..").join("data").join("tmp"));

        assert!(matches!(
            resolver.resolve(),
            Err(PlatformError::DirectoryUnavailable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_temp_dir_is_rejected() {
        let temp = tempdir().unwrap();
        let data = temp.path().join("data");
        fs::create_dir_all(&data).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&data, &link).unwrap();

        let aliased = PathResolver::new("app").with_data_dir(&data).with_temp_dir(&link);
        assert!(matches!(
            aliased.resolve(),
            Err(PlatformError::DirectoryUnavailable { .. })
        ));

        let nested = PathResolver::new("app")
            .with_data_dir(&data)
            .with_temp_dir(link.join("tmp"));
        assert!(matches!(
            nested.resolve(),
            Err(PlatformError::DirectoryUnavailable { .. })
        ));
    }

    #[test]
    fn resolved_paths_are_canonical() {
        let temp = tempdir().unwrap();
        let resolver = PathResolver::new("app")
            .with_data_dir(temp.path().join("x").join("..").join("data"))
            .with_temp_dir(temp.path().join("scratch"));

        let dirs = resolver.resolve().unwrap();
        assert_eq!(dirs.private_data, fs::canonicalize(temp.path().join("data")).unwrap());
        assert_eq!(resolver.private_data_directory().unwrap(), dirs.private_data);
    }

    #[test]
    fn bad_app_name_is_rejected() {
        let resolver = PathResolver::new("../escape").with_env(|_| Some("/home/u".into()));
        let err = resolver.private_data_directory().unwrap_err();
        assert!(matches!(err, PlatformError::InvalidAppName { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn private_directory_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let resolver = PathResolver::new("app")
            .with_data_dir(temp.path().join("data"))
            .with_temp_dir(temp.path().join("scratch"));
        let dirs = resolver.resolve().unwrap();

        let mode = fs::metadata(&dirs.private_data).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
