//! # Sovra Storage
//!
//! Blob store trait and implementations for Sovra.
//!
//! This crate provides the lowest-level storage abstraction for the vault.
//! Blob stores are **opaque byte stores** addressed by validated relative
//! paths; encryption is a wrapper, not a property of the store.
//!
//! ## Design Principles
//!
//! - Whole-blob writes are atomic: readers never observe partial content
//! - Writes to one path are serialized; different paths proceed in parallel
//! - Paths cannot escape the store root
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral vaults
//! - [`FileStore`] - Durable storage using write-to-temporary then rename
//! - [`EncryptedStore`] - Wrapper that adds AES-256-GCM encryption
//!
//! ## Example
//!
//! ```rust
//! use sovra_storage::{BlobStore, MemoryStore, RelativePath};
//!
//! let store = MemoryStore::new();
//! let path = RelativePath::new("notes/today.txt").unwrap();
//! store.write(&path, b"hello world").unwrap();
//! assert_eq!(store.read(&path).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod encrypted;
mod envelope;
mod error;
mod file;
mod lock;
mod memory;
mod path;

pub use backend::BlobStore;
pub use encrypted::EncryptedStore;
pub use envelope::{
    EncryptionKey, Envelope, FORMAT_VERSION, KEY_SIZE, NONCE_SIZE, OVERHEAD, TAG_SIZE,
};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use lock::{PathGuard, PathLocks};
pub use memory::MemoryStore;
pub use path::{RelativePath, HEALTH_PREFIX, MAX_COMPONENT_LEN, TEMP_PREFIX};
pub use tokio_util::sync::CancellationToken;
