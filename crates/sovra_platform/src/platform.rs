//! Platform descriptor and per-platform directory conventions.
//!
//! Each supported platform is a zero-sized type implementing [`Platform`].
//! The native one is selected at compile time; [`Platform::for_kind`] is the
//! runtime dispatch table used when a caller needs the conventions of a
//! different platform (tests, tooling).

use crate::paths::EnvLookup;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// The kinds of platform Sovra knows how to store data on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    /// Android (application sandbox supplied by the host app).
    Android,
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    MacOs,
    /// Linux and other Unix-likes following the XDG base directory layout.
    Linux,
}

impl PlatformKind {
    /// Human readable platform name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            PlatformKind::Android => "Android",
            PlatformKind::Windows => "Windows",
            PlatformKind::MacOs => "macOS",
            PlatformKind::Linux => "Linux",
        }
    }

    /// Stable lowercase identifier, used in persisted metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PlatformKind::Android => "android",
            PlatformKind::Windows => "windows",
            PlatformKind::MacOs => "macos",
            PlatformKind::Linux => "linux",
        }
    }

    /// Parses an identifier produced by [`as_str`](Self::as_str).
    #[must_use]
    pub fn from_str_id(id: &str) -> Option<Self> {
        match id {
            "android" => Some(PlatformKind::Android),
            "windows" => Some(PlatformKind::Windows),
            "macos" => Some(PlatformKind::MacOs),
            "linux" => Some(PlatformKind::Linux),
            _ => None,
        }
    }

    /// The platform this binary was compiled for.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_os = "android") {
            PlatformKind::Android
        } else if cfg!(target_os = "windows") {
            PlatformKind::Windows
        } else if cfg!(target_os = "macos") {
            PlatformKind::MacOs
        } else {
            PlatformKind::Linux
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Immutable identification of the running platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Platform kind.
    pub kind: PlatformKind,
    /// Human readable name.
    pub display_name: &'static str,
}

impl PlatformInfo {
    /// Builds the descriptor for a platform kind.
    #[must_use]
    pub const fn for_kind(kind: PlatformKind) -> Self {
        Self {
            kind,
            display_name: kind.display_name(),
        }
    }
}

/// Returns the descriptor of the running platform.
///
/// Computed on first use and cached for the lifetime of the process.
pub fn current_platform() -> &'static PlatformInfo {
    static CURRENT: OnceLock<PlatformInfo> = OnceLock::new();
    CURRENT.get_or_init(|| PlatformInfo::for_kind(PlatformKind::native()))
}

/// Per-platform storage conventions.
///
/// Implementations only compute locations; creating directories and
/// validating them is the job of [`crate::PathResolver`].
pub trait Platform: Send + Sync + fmt::Debug {
    /// The platform this implementation describes.
    fn kind(&self) -> PlatformKind;

    /// Default private data directory for `app_name`, or `None` if the
    /// platform exposes no convention reachable from `env`.
    fn default_data_dir(&self, app_name: &str, env: EnvLookup<'_>) -> Option<PathBuf>;

    /// Default scratch directory for `app_name`.
    ///
    /// `data_dir` is the already resolved private data directory, for
    /// platforms whose cache location is derived from it.
    fn default_temp_dir(&self, app_name: &str, data_dir: &Path, env: EnvLookup<'_>)
        -> Option<PathBuf>;

    /// Descriptor for this platform.
    fn info(&self) -> PlatformInfo {
        PlatformInfo::for_kind(self.kind())
    }
}

impl dyn Platform {
    /// Returns the implementation for `kind`.
    #[must_use]
    pub fn for_kind(kind: PlatformKind) -> &'static dyn Platform {
        match kind {
            PlatformKind::Android => &Android,
            PlatformKind::Windows => &Windows,
            PlatformKind::MacOs => &MacOs,
            PlatformKind::Linux => &Linux,
        }
    }

    /// Returns the implementation for the compile-time target.
    #[must_use]
    pub fn native() -> &'static dyn Platform {
        Self::for_kind(PlatformKind::native())
    }
}

/// Reads an environment variable that must hold an absolute path.
///
/// Empty and relative values are ignored, as the XDG spec requires.
fn absolute_var(env: EnvLookup<'_>, name: &str) -> Option<PathBuf> {
    let value = env(name)?;
    if value.is_empty() {
        return None;
    }
    let path = PathBuf::from(value);
    path.is_absolute().then_some(path)
}

/// XDG base directory layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linux;

impl Platform for Linux {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Linux
    }

    fn default_data_dir(&self, app_name: &str, env: EnvLookup<'_>) -> Option<PathBuf> {
        absolute_var(env, "XDG_DATA_HOME")
            .or_else(|| absolute_var(env, "HOME").map(|home| home.join(".local").join("share")))
            .map(|base| base.join(app_name))
    }

    fn default_temp_dir(
        &self,
        app_name: &str,
        _data_dir: &Path,
        env: EnvLookup<'_>,
    ) -> Option<PathBuf> {
        absolute_var(env, "XDG_CACHE_HOME")
            .or_else(|| absolute_var(env, "HOME").map(|home| home.join(".cache")))
            .map(|base| base.join(app_name).join("tmp"))
    }
}

/// `~/Library` layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacOs;

impl Platform for MacOs {
    fn kind(&self) -> PlatformKind {
        PlatformKind::MacOs
    }

    fn default_data_dir(&self, app_name: &str, env: EnvLookup<'_>) -> Option<PathBuf> {
        absolute_var(env, "HOME")
            .map(|home| home.join("Library").join("Application Support").join(app_name))
    }

    fn default_temp_dir(
        &self,
        app_name: &str,
        _data_dir: &Path,
        env: EnvLookup<'_>,
    ) -> Option<PathBuf> {
        absolute_var(env, "HOME")
            .map(|home| home.join("Library").join("Caches").join(app_name).join("tmp"))
    }
}

/// Known-folder layout (`%LOCALAPPDATA%`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Windows;

impl Platform for Windows {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Windows
    }

    fn default_data_dir(&self, app_name: &str, env: EnvLookup<'_>) -> Option<PathBuf> {
        absolute_var(env, "LOCALAPPDATA")
            .or_else(|| absolute_var(env, "APPDATA"))
            .map(|base| base.join(app_name))
    }

    fn default_temp_dir(
        &self,
        app_name: &str,
        _data_dir: &Path,
        env: EnvLookup<'_>,
    ) -> Option<PathBuf> {
        absolute_var(env, "LOCALAPPDATA").map(|base| base.join(app_name).join("Temp"))
    }
}

/// Android application sandbox.
///
/// Native code cannot discover `Context.getFilesDir()` on its own, so the
/// data directory must be configured by the host application.
#[derive(Debug, Clone, Copy, Default)]
pub struct Android;

impl Platform for Android {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Android
    }

    fn default_data_dir(&self, _app_name: &str, _env: EnvLookup<'_>) -> Option<PathBuf> {
        None
    }

    fn default_temp_dir(
        &self,
        app_name: &str,
        data_dir: &Path,
        _env: EnvLookup<'_>,
    ) -> Option<PathBuf> {
        // files/ and cache/ are siblings inside the app sandbox
        let sandbox = data_dir.parent()?;
        Some(sandbox.join("cache").join(format!("{app_name}-tmp")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsString;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), OsString::from(*v)))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn current_platform_is_cached() {
        let a = current_platform();
        let b = current_platform();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.kind, PlatformKind::native());
        assert_eq!(a.display_name, a.kind.display_name());
    }

    #[test]
    fn kind_ids_round_trip() {
        for kind in [
            PlatformKind::Android,
            PlatformKind::Windows,
            PlatformKind::MacOs,
            PlatformKind::Linux,
        ] {
            assert_eq!(PlatformKind::from_str_id(kind.as_str()), Some(kind));
            assert_eq!(<dyn Platform>::for_kind(kind).kind(), kind);
        }
        assert_eq!(PlatformKind::from_str_id("beos"), None);
    }

    #[test]
    fn linux_prefers_xdg() {
        let env = env_of(&[("XDG_DATA_HOME", "/x/data"), ("XDG_CACHE_HOME", "/x/cache"), ("HOME", "/home/u")]);
        let data = Linux.default_data_dir("app", &env).unwrap();
        assert_eq!(data, PathBuf::from("/x/data/app"));
        let temp = Linux.default_temp_dir("app", &data, &env).unwrap();
        assert_eq!(temp, PathBuf::from("/x/cache/app/tmp"));
    }

    #[test]
    fn linux_falls_back_to_home() {
        let env = env_of(&[("HOME", "/home/u"), ("XDG_DATA_HOME", "relative/path")]);
        let data = Linux.default_data_dir("app", &env).unwrap();
        assert_eq!(data, PathBuf::from("/home/u/.local/share/app"));
        let temp = Linux.default_temp_dir("app", &data, &env).unwrap();
        assert_eq!(temp, PathBuf::from("/home/u/.cache/app/tmp"));
    }

    #[test]
    fn linux_without_home_has_no_default() {
        let env = env_of(&[]);
        assert!(Linux.default_data_dir("app", &env).is_none());
    }

    #[test]
    fn macos_uses_library() {
        let env = env_of(&[("HOME", "/Users/u")]);
        let data = MacOs.default_data_dir("app", &env).unwrap();
        assert_eq!(data, PathBuf::from("/Users/u/Library/Application Support/app"));
        let temp = MacOs.default_temp_dir("app", &data, &env).unwrap();
        assert_eq!(temp, PathBuf::from("/Users/u/Library/Caches/app/tmp"));
    }

    #[cfg(windows)]
    #[test]
    fn windows_uses_local_app_data() {
        let env = env_of(&[("LOCALAPPDATA", r"C:\Users\u\AppData\Local")]);
        let data = Windows.default_data_dir("app", &env).unwrap();
        assert_eq!(data, PathBuf::from(r"C:\Users\u\AppData\Local\app"));
    }

    #[test]
    fn android_requires_configuration() {
        let env = env_of(&[("HOME", "/")]);
        assert!(Android.default_data_dir("app", &env).is_none());

        let files = PathBuf::from("/data/user/0/com.example/files");
        let temp = Android.default_temp_dir("app", &files, &env).unwrap();
        assert_eq!(temp, PathBuf::from("/data/user/0/com.example/cache/app-tmp"));
    }
}
