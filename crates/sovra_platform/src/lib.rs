//! # Sovra Platform
//!
//! Platform identification and private directory resolution for Sovra.
//!
//! This crate is the lowest layer of the vault. It answers two questions:
//!
//! - which platform the process is running on ([`current_platform`])
//! - where the private data directory and the scratch workspace live
//!   ([`PathResolver`])
//!
//! It knows nothing about encryption, file formats or locking.
//!
//! ## Example
//!
//! ```no_run
//! use sovra_platform::{current_platform, PathResolver};
//!
//! let platform = current_platform();
//! println!("running on {}", platform.display_name);
//!
//! let resolver = PathResolver::new("my-app");
//! let dirs = resolver.resolve().unwrap();
//! println!("private data: {}", dirs.private_data.display());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod paths;
mod platform;

pub use error::{PlatformError, PlatformResult};
pub use paths::{EnvLookup, PathResolver, ResolvedDirs};
pub use platform::{current_platform, Android, Linux, MacOs, Platform, PlatformInfo, PlatformKind, Windows};
