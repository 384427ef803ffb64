//! Benchmark utilities for Sovra.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::RngCore;
use sovra_core::{StaticCredential, Vault, VaultConfig, VaultResult};
use std::path::Path;

/// Payload sizes exercised by the benchmarks.
pub const SIZES: [usize; 4] = [256, 4 * 1024, 64 * 1024, 1024 * 1024];

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

/// Opens a vault with `data/` and `scratch/` directories under `root`.
///
/// # Errors
///
/// Returns an error if the vault cannot be initialized.
pub fn open_vault(root: &Path, sync_writes: bool) -> VaultResult<Vault> {
    let config = VaultConfig::new()
        .data_dir(root.join("data"))
        .temp_dir(root.join("scratch"))
        .sync_writes(sync_writes);
    Vault::open(config, &StaticCredential::new(b"benchmark key material".to_vec()))
}
