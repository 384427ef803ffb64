//! # Sovra Testkit
//!
//! Test utilities for Sovra.
//!
//! This crate provides:
//! - Test fixtures and vault helpers
//! - Property-based test generators using proptest
//! - Crash simulation for interrupted writes
//! - Concurrency stress utilities
//!
//! ## Usage
//!
//! ```rust
//! use sovra_testkit::prelude::*;
//!
//! with_temp_vault(|vault| {
//!     vault.write_bytes("a", b"payload").unwrap();
//!     assert!(vault.exists("a"));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
