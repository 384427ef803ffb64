//! Sovra CLI
//!
//! Command-line tools for Sovra vaults.
//!
//! # Commands
//!
//! - `info` - Display platform, directories and vault metadata
//! - `put` - Store a file in the vault
//! - `get` - Read a file from the vault
//! - `rm` - Delete a file from the vault
//! - `exists` - Check whether a file is stored
//! - `ls` - List stored files
//! - `verify` - Check that every stored file decrypts
//!
//! Key material is read from `SOVRA_PASSPHRASE`.

mod commands;

use clap::{Parser, Subcommand};
use sovra_core::{PassphraseCredential, Vault, VaultConfig, DEFAULT_APP_NAME};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Sovereign private data vault tools.
#[derive(Parser)]
#[command(name = "sovra")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Private data directory (defaults to the platform convention)
    #[arg(global = true, long, env = "SOVRA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Scratch directory (defaults to the platform convention)
    #[arg(global = true, long, env = "SOVRA_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Application name used for the default directories
    #[arg(global = true, long, env = "SOVRA_APP_NAME", default_value = DEFAULT_APP_NAME)]
    app_name: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display platform, directories and vault metadata
    Info {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Store a file in the vault
    Put {
        /// Relative path inside the vault
        path: String,

        /// Read content from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Read a file from the vault
    Get {
        /// Relative path inside the vault
        path: String,

        /// Write content to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a file from the vault
    Rm {
        /// Relative path inside the vault
        path: String,
    },

    /// Check whether a file is stored (exit status 1 if not)
    Exists {
        /// Relative path inside the vault
        path: String,
    },

    /// List stored files
    Ls {
        /// Only list files under this path
        prefix: Option<String>,
    },

    /// Check that every stored file decrypts
    Verify,
}

impl Cli {
    fn config(&self) -> VaultConfig {
        let mut config = VaultConfig::new().app_name(self.app_name.clone());
        if let Some(dir) = &self.data_dir {
            config = config.data_dir(dir.clone());
        }
        if let Some(dir) = &self.temp_dir {
            config = config.temp_dir(dir.clone());
        }
        config
    }

    fn open_vault(&self) -> Result<Vault, Box<dyn std::error::Error>> {
        Ok(Vault::open(self.config(), &PassphraseCredential::from_env())?)
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so `get` can stream content on stdout.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Info { format } => {
            commands::info::run(&Vault::new(cli.config()), format)?;
        }
        Commands::Put { path, input } => {
            commands::files::put(&cli.open_vault()?, path, input.as_deref())?;
        }
        Commands::Get { path, output } => {
            commands::files::get(&cli.open_vault()?, path, output.as_deref())?;
        }
        Commands::Rm { path } => {
            if !commands::files::rm(&cli.open_vault()?, path)? {
                eprintln!("{path}: not stored");
            }
        }
        Commands::Exists { path } => {
            let found = cli.open_vault()?.exists(path);
            println!("{found}");
            if !found {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Ls { prefix } => {
            let vault = cli.open_vault()?;
            commands::files::ls(&vault, prefix.as_deref(), &mut std::io::stdout().lock())?;
        }
        Commands::Verify => {
            let report = commands::verify::run(&cli.open_vault()?)?;
            report.print();
            if !report.is_ok() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["sovra", "ls", "--data-dir", "/v", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config().data_dir, Some(PathBuf::from("/v")));
        assert!(matches!(cli.command, Commands::Ls { prefix: None }));
    }

    #[test]
    fn put_requires_a_path() {
        assert!(Cli::try_parse_from(["sovra", "put"]).is_err());
    }
}
