//! Info command implementation.

use serde::Serialize;
use sovra_core::{Manifest, Vault, MANIFEST_FILE};
use std::fs;
use std::io;

/// Vault information.
#[derive(Debug, Serialize)]
pub struct InfoResult {
    /// Platform display name.
    pub platform: String,
    /// Private data directory.
    pub private_data_directory: String,
    /// Scratch directory.
    pub temp_workspace_directory: String,
    /// Whether a manifest exists.
    pub initialized: bool,
    /// Vault id, if initialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_id: Option<String>,
    /// Platform that created the vault, if initialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Manifest format version, if initialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u16>,
    /// Argon2id parameters, if the vault is passphrase based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase_kdf: Option<String>,
}

/// Collects information without unlocking the vault.
pub fn collect(vault: &Vault) -> Result<InfoResult, Box<dyn std::error::Error>> {
    let private = vault.private_data_directory()?;
    let temp = vault.temp_workspace_directory()?;

    let manifest = match fs::read(private.join(MANIFEST_FILE)) {
        Ok(data) => Some(Manifest::decode(&data)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    Ok(InfoResult {
        platform: vault.platform().display_name.to_string(),
        private_data_directory: private.display().to_string(),
        temp_workspace_directory: temp.display().to_string(),
        initialized: manifest.is_some(),
        vault_id: manifest.as_ref().map(|m| m.vault_id.to_string()),
        created_by: manifest.as_ref().map(|m| m.created_by.clone()),
        format_version: manifest.as_ref().map(|m| m.format_version),
        passphrase_kdf: manifest.as_ref().and_then(|m| m.passphrase_kdf).map(|p| {
            format!(
                "argon2id m={}KiB t={} p={}",
                p.m_cost_kib, p.t_cost, p.p_cost
            )
        }),
    })
}

/// Runs the info command.
pub fn run(vault: &Vault, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(vault)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InfoResult) {
    println!("Platform:        {}", result.platform);
    println!("Private data:    {}", result.private_data_directory);
    println!("Temp workspace:  {}", result.temp_workspace_directory);
    match &result.vault_id {
        Some(id) => {
            println!("Vault id:        {id}");
            if let Some(created_by) = &result.created_by {
                println!("Created on:      {created_by}");
            }
            if let Some(kdf) = &result.passphrase_kdf {
                println!("Passphrase KDF:  {kdf}");
            }
        }
        None => println!("Vault:           not initialized"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sovra_core::{StaticCredential, VaultConfig};

    fn config(root: &tempfile::TempDir) -> VaultConfig {
        VaultConfig::new()
            .data_dir(root.path().join("data"))
            .temp_dir(root.path().join("tmp"))
    }

    #[test]
    fn info_before_and_after_initialize() {
        let root = tempfile::tempdir().unwrap();

        let info = collect(&Vault::new(config(&root))).unwrap();
        assert!(!info.initialized);
        assert!(info.vault_id.is_none());

        let vault = Vault::open(config(&root), &StaticCredential::new(b"cli test key".to_vec())).unwrap();
        let id = vault.vault_id().unwrap().to_string();

        let info = collect(&vault).unwrap();
        assert!(info.initialized);
        assert_eq!(info.vault_id, Some(id));
        assert_eq!(info.format_version, Some(sovra_core::MANIFEST_VERSION));
        assert!(info.passphrase_kdf.is_none());
    }
}
