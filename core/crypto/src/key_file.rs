//! Persistence of the master key.
//!
//! The key file holds exactly [`KEY_LENGTH`] raw bytes with no header. It is
//! written once when the vault is first opened and never rewritten.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::keys::{MasterKey, KEY_LENGTH};
use passvault_common::{Error, Result};

/// Load the master key from `path`, generating and persisting one if absent.
///
/// # Postconditions
/// - The returned key equals the key stored at `path`
/// - A newly created file is readable and writable by the owner only (Unix)
///
/// # Errors
/// - `KeyFile` if the file cannot be read or created
/// - `KeyFile` if an existing file does not hold exactly KEY_LENGTH bytes
pub fn load_or_create_key(path: &Path) -> Result<MasterKey> {
    match fs::read(path) {
        Ok(bytes) => {
            debug!(path = %path.display(), "Loading master key");
            key_from_file_bytes(path, Zeroizing::new(bytes))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => create_key(path),
        Err(e) => Err(key_error(path, "cannot read", e)),
    }
}

fn key_from_file_bytes(path: &Path, bytes: Zeroizing<Vec<u8>>) -> Result<MasterKey> {
    if bytes.len() != KEY_LENGTH {
        return Err(Error::KeyFile(format!(
            "{}: expected {} bytes, found {}",
            path.display(),
            KEY_LENGTH,
            bytes.len()
        )));
    }

    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&bytes);
    let master = MasterKey::from_bytes(key);
    zeroize::Zeroize::zeroize(&mut key);
    Ok(master)
}

fn create_key(path: &Path) -> Result<MasterKey> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| key_error(parent, "cannot create directory", e))?;
    }

    let key = MasterKey::generate();

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| key_error(path, "cannot create", e))?;
    file.write_all(key.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| key_error(path, "cannot write", e))?;

    info!(path = %path.display(), "Generated new master key");
    Ok(key)
}

fn key_error(path: &Path, action: &str, err: std::io::Error) -> Error {
    Error::KeyFile(format!("{} {}: {}", action, path.display(), err))
}
