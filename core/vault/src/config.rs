//! Vault configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use passvault_common::{Error, Result};
use passvault_crypto::DEFAULT_LENGTH;

/// Default location of the master key file.
pub const DEFAULT_KEY_FILE: &str = "encryption_key.key";

/// Default location of the credential database.
pub const DEFAULT_DATABASE: &str = "data/password_manager.db";

/// Where the vault keeps its files and how it generates passwords.
///
/// Relative paths are resolved against the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Master key file.
    pub key_file: PathBuf,
    /// SQLite database file.
    pub database: PathBuf,
    /// Length of passwords generated for blank input.
    pub generated_length: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            database: PathBuf::from(DEFAULT_DATABASE),
            generated_length: DEFAULT_LENGTH,
        }
    }
}

impl VaultConfig {
    /// Read configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
