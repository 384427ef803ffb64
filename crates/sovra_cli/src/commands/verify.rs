//! Verify command implementation.

use sovra_core::{ErrorKind, Vault};

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Number of files checked.
    pub files_checked: usize,
    /// Number of files that decrypted.
    pub valid_files: usize,
    /// Files that failed, with the reason.
    pub errors: Vec<(String, String)>,
}

impl VerifyReport {
    /// Returns true if every file decrypted.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Prints the report.
    pub fn print(&self) {
        println!("Files checked: {}", self.files_checked);
        println!("Valid:         {}", self.valid_files);
        if self.is_ok() {
            println!("Status:        OK");
        } else {
            println!("Status:        {} file(s) FAILED", self.errors.len());
            for (path, reason) in &self.errors {
                println!("  - {path}: {reason}");
            }
        }
    }
}

/// Runs the health check, then reads back every stored file.
pub fn run(vault: &Vault) -> Result<VerifyReport, Box<dyn std::error::Error>> {
    vault.health_check()?;

    let mut report = VerifyReport::default();
    for path in vault.list(None)? {
        report.files_checked += 1;
        match vault.read_bytes(path.as_str()) {
            Ok(_) => report.valid_files += 1,
            // Deleted since listing.
            Err(e) if e.kind() == ErrorKind::NotFound => report.files_checked -= 1,
            Err(e) => report.errors.push((path.to_string(), e.to_string())),
        }
    }
    Ok(report)
}
