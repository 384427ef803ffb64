//! File commands: put, get, rm, ls.

use sovra_core::Vault;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Stores `input` (or stdin) at `path`.
pub fn put(vault: &Vault, path: &str, input: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let data = match input {
        Some(file) => fs::read(file)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            buf
        }
    };
    vault.write_bytes(path, &data)?;
    tracing::info!(path, bytes = data.len(), "stored");
    Ok(())
}

/// Writes the content at `path` to `output` (or stdout).
pub fn get(vault: &Vault, path: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let data = vault.read_bytes(path)?;
    match output {
        Some(file) => fs::write(file, &data)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Deletes `path`. Returns false if nothing was stored there.
pub fn rm(vault: &Vault, path: &str) -> Result<bool, Box<dyn std::error::Error>> {
    Ok(vault.delete_file(path)?)
}

/// Prints stored paths, one per line.
pub fn ls(vault: &Vault, prefix: Option<&str>, out: &mut dyn Write) -> Result<(), Box<dyn std::error::Error>> {
    for path in vault.list(prefix)? {
        writeln!(out, "{path}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sovra_core::{StaticCredential, VaultConfig};

    #[test]
    fn put_get_rm_through_files() {
        let root = tempfile::tempdir().unwrap();
        let config = VaultConfig::new()
            .data_dir(root.path().join("data"))
            .temp_dir(root.path().join("tmp"));
        let vault = Vault::open(config, &StaticCredential::new(b"cli test key".to_vec())).unwrap();

        let input = root.path().join("in.txt");
        let output = root.path().join("out.txt");
        fs::write(&input, b"from disk").unwrap();

        put(&vault, "docs/in.txt", Some(&input)).unwrap();
        get(&vault, "docs/in.txt", Some(&output)).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"from disk");

        let mut listing = Vec::new();
        ls(&vault, None, &mut listing).unwrap();
        assert_eq!(String::from_utf8(listing).unwrap(), "docs/in.txt\n");

        assert!(rm(&vault, "docs/in.txt").unwrap());
        assert!(!rm(&vault, "docs/in.txt").unwrap());
    }
}
