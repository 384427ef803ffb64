//! CLI command implementations.

pub mod files;
pub mod info;
pub mod verify;
