//! Property tests for the vault.

use proptest::prelude::*;
use sovra_core::ErrorKind;
use sovra_storage::{BlobStore, EncryptedStore, EncryptionKey, Envelope, MemoryStore, RelativePath};
use sovra_testkit::{
    fixtures::TestVault, invalid_path_strategy, payload_strategy, relative_path_strategy,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn vault_returns_what_was_written(
        writes in prop::collection::vec((relative_path_strategy(), payload_strategy()), 1..8)
    ) {
        let vault = TestVault::with_config(|c| c.sync_writes(false));
        let mut expected = std::collections::BTreeMap::new();

        for (path, data) in &writes {
            // Lowercase so case-insensitive file systems see the same layout.
            let path = path.to_lowercase();
            // A file path cannot also be a directory; skip conflicting layouts.
            if vault.write_bytes(&path, data).is_ok() {
                expected.insert(path, data.clone());
            }
        }
        for (path, data) in &expected {
            prop_assert!(vault.exists(path));
            prop_assert_eq!(&vault.read_bytes(path).unwrap(), data);
        }
    }

    #[test]
    fn last_write_wins(path in relative_path_strategy(), a in payload_strategy(), b in payload_strategy()) {
        let vault = TestVault::with_config(|c| c.sync_writes(false));
        vault.write_bytes(&path, &a).unwrap();
        vault.write_bytes(&path, &b).unwrap();
        prop_assert_eq!(vault.read_bytes(&path).unwrap(), b);
    }

    #[test]
    fn invalid_paths_never_touch_the_vault(path in invalid_path_strategy()) {
        let vault = TestVault::with_config(|c| c.sync_writes(false));
        prop_assert!(!vault.exists(&path));
        prop_assert_eq!(vault.read_bytes(&path).unwrap_err().kind(), ErrorKind::InvalidPath);
        prop_assert_eq!(vault.write_bytes(&path, b"x").unwrap_err().kind(), ErrorKind::InvalidPath);
        prop_assert_eq!(vault.delete_file(&path).unwrap_err().kind(), ErrorKind::InvalidPath);
        prop_assert!(vault.list(None).unwrap().is_empty());
    }

    #[test]
    fn encrypted_memory_store_roundtrip(path in relative_path_strategy(), data in payload_strategy()) {
        let store = EncryptedStore::new(MemoryStore::new(), Envelope::new(EncryptionKey::generate()));
        let path = RelativePath::new(&path).unwrap();
        store.write(&path, &data).unwrap();
        prop_assert_eq!(store.read(&path).unwrap(), data);
    }
}
