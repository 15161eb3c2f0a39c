//! Opening a vault from its configuration.

use tracing::info;

use crate::config::VaultConfig;
use crate::service::VaultService;
use passvault_common::{Error, Result};
use passvault_crypto::{load_or_create_key, Cipher, PasswordGenerator};
use passvault_storage::{CredentialStore, SqliteStore};

/// Vault backed by the SQLite credential store.
pub type SqliteVault = VaultService<SqliteStore>;

/// Load (or create) the master key, open the database and assemble the vault.
///
/// # Postconditions
/// - The key file and database exist at the configured paths
///
/// # Errors
/// - `Config` if the generated password length is zero
/// - `KeyFile` if the key cannot be loaded or created
/// - `Storage` if the database cannot be opened
pub fn open_vault(config: &VaultConfig) -> Result<SqliteVault> {
    let generator = PasswordGenerator::new(config.generated_length)
        .map_err(|e| Error::Config(format!("generated_length: {}", e)))?;

    let key = load_or_create_key(&config.key_file)?;
    let store = SqliteStore::open(&config.database)?;

    let stats = store.stats()?;
    info!(
        users = stats.users,
        credentials = stats.credentials,
        generated_length = generator.length(),
        "Vault opened"
    );

    Ok(VaultService::new(store, Cipher::new(key), generator))
}
