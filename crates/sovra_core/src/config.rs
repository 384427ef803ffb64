//! Vault configuration.

use sovra_platform::{PathResolver, PlatformKind};
use std::path::PathBuf;

/// Application name used when none is configured.
pub const DEFAULT_APP_NAME: &str = "sovra";

/// Environment variable overriding the private data directory.
pub const ENV_DATA_DIR: &str = "SOVRA_DATA_DIR";
/// Environment variable overriding the scratch directory.
pub const ENV_TEMP_DIR: &str = "SOVRA_TEMP_DIR";
/// Environment variable overriding the application name.
pub const ENV_APP_NAME: &str = "SOVRA_APP_NAME";

/// Configuration for opening a vault.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Application name; the leaf of the platform-conventional directories.
    pub app_name: String,

    /// Explicit private data directory. Required on Android.
    pub data_dir: Option<PathBuf>,

    /// Explicit scratch directory.
    pub temp_dir: Option<PathBuf>,

    /// Apply the conventions of another platform instead of the native one.
    pub platform: Option<PlatformKind>,

    /// Whether to fsync files and directories on every write (safer but slower).
    pub sync_writes: bool,

    /// Whether to remove temporaries left by interrupted writes on startup.
    pub sweep_on_open: bool,

    /// Whether to empty the scratch directory on startup.
    pub clear_temp_on_open: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            data_dir: None,
            temp_dir: None,
            platform: None,
            sync_writes: true,
            sweep_on_open: true,
            clear_temp_on_open: true,
        }
    }
}

impl VaultConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from `SOVRA_APP_NAME`, `SOVRA_DATA_DIR` and
    /// `SOVRA_TEMP_DIR`. Unset or empty variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<std::ffi::OsString>) -> Self {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let mut config = Self::default();
        if let Some(name) = var(ENV_APP_NAME) {
            config.app_name = name.to_string_lossy().into_owned();
        }
        config.data_dir = var(ENV_DATA_DIR).map(PathBuf::from);
        config.temp_dir = var(ENV_TEMP_DIR).map(PathBuf::from);
        config
    }

    /// Sets the application name.
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Sets the private data directory.
    #[must_use]
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the scratch directory.
    #[must_use]
    pub fn temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    /// Applies the directory conventions of `kind`.
    #[must_use]
    pub const fn platform(mut self, kind: PlatformKind) -> Self {
        self.platform = Some(kind);
        self
    }

    /// Sets whether to fsync on every write.
    #[must_use]
    pub const fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Sets whether to sweep interrupted writes on startup.
    #[must_use]
    pub const fn sweep_on_open(mut self, value: bool) -> Self {
        self.sweep_on_open = value;
        self
    }

    /// Sets whether to empty the scratch directory on startup.
    #[must_use]
    pub const fn clear_temp_on_open(mut self, value: bool) -> Self {
        self.clear_temp_on_open = value;
        self
    }

    /// Builds the path resolver this configuration describes.
    #[must_use]
    pub fn resolver(&self) -> PathResolver {
        let mut resolver = PathResolver::new(self.app_name.clone());
        if let Some(kind) = self.platform {
            resolver = resolver.with_platform(kind);
        }
        if let Some(dir) = &self.data_dir {
            resolver = resolver.with_data_dir(dir.clone());
        }
        if let Some(dir) = &self.temp_dir {
            resolver = resolver.with_temp_dir(dir.clone());
        }
        resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn default_config() {
        let config = VaultConfig::default();
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert!(config.sync_writes);
        assert!(config.sweep_on_open);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn builder_pattern() {
        let config = VaultConfig::new()
            .app_name("notes")
            .data_dir("/v/data")
            .sync_writes(false)
            .platform(PlatformKind::Android);

        assert_eq!(config.app_name, "notes");
        assert_eq!(config.data_dir, Some(PathBuf::from("/v/data")));
        assert!(!config.sync_writes);
        assert_eq!(config.platform, Some(PlatformKind::Android));
        assert_eq!(config.resolver().platform().kind, PlatformKind::Android);
    }

    #[test]
    fn env_overrides() {
        let config = VaultConfig::from_lookup(|name| match name {
            ENV_APP_NAME => Some(OsString::from("journal")),
            ENV_DATA_DIR => Some(OsString::from("/srv/journal")),
            ENV_TEMP_DIR => Some(OsString::new()),
            _ => None,
        });

        assert_eq!(config.app_name, "journal");
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/journal")));
        assert_eq!(config.temp_dir, None);
    }
}
