//! Integration tests for the async facade.

use sovra_core::{AsyncVault, ErrorKind, StaticCredential, Vault, VaultConfig};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn open(root: &TempDir) -> AsyncVault {
    let config = VaultConfig::new()
        .data_dir(root.path().join("data"))
        .temp_dir(root.path().join("scratch"));
    let vault = Vault::open(config, &StaticCredential::new(b"async test material".to_vec())).unwrap();
    AsyncVault::new(vault)
}

fn has_temporaries(root: &TempDir) -> bool {
    fs::read_dir(root.path().join("data"))
        .unwrap()
        .any(|e| e.unwrap().file_name().to_string_lossy().starts_with(".tmp-"))
}

#[tokio::test]
async fn async_roundtrip() {
    let root = tempfile::tempdir().unwrap();
    let vault = open(&root);

    vault.write_bytes("a/b", b"async bytes".to_vec()).await.unwrap();
    assert!(vault.exists("a/b").await);
    assert_eq!(vault.read_bytes("a/b").await.unwrap(), b"async bytes");
    assert_eq!(vault.list(None).await.unwrap().len(), 1);
    assert!(vault.delete_file("a/b").await.unwrap());
    assert!(!vault.delete_file("a/b").await.unwrap());
    vault.health_check().await.unwrap();
}

#[tokio::test]
async fn async_errors_keep_their_kind() {
    let root = tempfile::tempdir().unwrap();
    let vault = open(&root);

    let err = vault.read_bytes("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = vault.read_bytes("../escape").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPath);
}

#[tokio::test]
async fn dropped_write_leaves_old_or_new_content() {
    let root = tempfile::tempdir().unwrap();
    let vault = open(&root);
    vault.write_bytes("doc", b"old".to_vec()).await.unwrap();

    let payload = vec![7u8; 4 * 1024 * 1024];
    // Elapses immediately, dropping the write future after its first poll.
    let _ = tokio::time::timeout(Duration::ZERO, vault.write_bytes("doc", payload.clone())).await;

    let content = vault.read_bytes("doc").await.unwrap();
    assert!(content == b"old" || content == payload);

    // Serializes behind the abandoned write if it is still running.
    vault.write_bytes("doc", b"final".to_vec()).await.unwrap();

    assert_eq!(vault.read_bytes("doc").await.unwrap(), b"final");
    assert!(!has_temporaries(&root));
}

#[tokio::test]
async fn shared_with_blocking_callers() {
    let root = tempfile::tempdir().unwrap();
    let vault = open(&root);

    let blocking = std::sync::Arc::clone(vault.vault());
    tokio::task::spawn_blocking(move || blocking.write_bytes("from-thread", b"hi"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(vault.read_bytes("from-thread").await.unwrap(), b"hi");
}
