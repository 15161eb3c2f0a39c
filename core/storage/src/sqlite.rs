//! SQLite-backed credential store.

use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

use crate::models::{SiteCredential, StoreStats, User};
use crate::schema::{CONNECTION_PRAGMAS, SCHEMA};
use crate::store::CredentialStore;
use passvault_common::{CredentialId, Envelope, Error, Result, UserId};

const CREDENTIAL_COLUMNS: &str = "id, user_id, website, username, password";

/// Credential store persisted in a single SQLite database file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create or open a credential database.
    ///
    /// # Postconditions
    /// - Missing parent directories are created
    /// - Tables exist and foreign keys are enforced
    ///
    /// # Errors
    /// - `Storage` if the database cannot be opened or initialized
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(db_path).map_err(storage_error)?;
        let store = Self::initialize(conn)?;

        info!(path = %db_path.display(), "Credential store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(CONNECTION_PRAGMAS)
            .map_err(storage_error)?;
        conn.execute_batch(SCHEMA).map_err(storage_error)?;
        Ok(Self { conn })
    }

    fn query_credentials(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<SiteCredential>> {
        let mut stmt = self.conn.prepare(sql).map_err(storage_error)?;
        let rows = stmt
            .query_map(params, credential_from_row)
            .map_err(storage_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_error)
    }

    fn count(&self, table: &str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(storage_error)?;
        Ok(count as u64)
    }
}

impl CredentialStore for SqliteStore {
    fn create_user(&self, name: &str, secret: &Envelope) -> Result<UserId> {
        debug!(name = %name, "Inserting user");
        match self.conn.execute(
            "INSERT INTO users (name, password) VALUES (?1, ?2)",
            params![name, secret.as_str()],
        ) {
            Ok(_) => Ok(UserId(self.conn.last_insert_rowid())),
            Err(e) if has_extended_code(&e, ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                Err(Error::DuplicateUser(name.to_string()))
            }
            Err(e) => Err(storage_error(e)),
        }
    }

    fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT user_id, name, password FROM users WHERE name = ?1",
                [name],
                |row| {
                    Ok(User {
                        user_id: UserId(row.get(0)?),
                        name: row.get(1)?,
                        secret: Envelope::from_encoded(row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()
            .map_err(storage_error)
    }

    fn update_user_secret(&self, user_id: UserId, secret: &Envelope) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET password = ?1 WHERE user_id = ?2",
                params![secret.as_str(), user_id.0],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("user {}", user_id))
    }

    fn delete_user(&self, user_id: UserId) -> Result<()> {
        debug!(user_id = %user_id, "Deleting user");
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE user_id = ?1", [user_id.0])
            .map_err(storage_error)?;
        require_changed(changed, || format!("user {}", user_id))
    }

    fn create_site_credential(
        &self,
        owner: UserId,
        site: &str,
        site_username: &str,
        secret: &Envelope,
    ) -> Result<CredentialId> {
        debug!(user_id = %owner, site = %site, "Inserting site credential");
        match self.conn.execute(
            "INSERT INTO passwords (user_id, website, username, password) VALUES (?1, ?2, ?3, ?4)",
            params![owner.0, site, site_username, secret.as_str()],
        ) {
            Ok(_) => Ok(CredentialId(self.conn.last_insert_rowid())),
            Err(e) if has_extended_code(&e, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                Err(Error::NotFound(format!("user {}", owner)))
            }
            Err(e) => Err(storage_error(e)),
        }
    }

    fn list_site_credentials(&self, owner: UserId) -> Result<Vec<SiteCredential>> {
        self.query_credentials(
            &format!(
                "SELECT {} FROM passwords WHERE user_id = ?1 ORDER BY id",
                CREDENTIAL_COLUMNS
            ),
            [owner.0],
        )
    }

    fn find_site_credentials_by_site(
        &self,
        owner: UserId,
        site: &str,
    ) -> Result<Vec<SiteCredential>> {
        self.query_credentials(
            &format!(
                "SELECT {} FROM passwords WHERE user_id = ?1 AND website = ?2 ORDER BY id",
                CREDENTIAL_COLUMNS
            ),
            params![owner.0, site],
        )
    }

    fn update_site_credential_secret(
        &self,
        id: CredentialId,
        owner: UserId,
        secret: &Envelope,
    ) -> Result<()> {
        set_credential_secret(&self.conn, id, owner, secret)
    }

    fn update_site_credential_secrets(
        &self,
        owner: UserId,
        updates: &[(CredentialId, Envelope)],
    ) -> Result<()> {
        debug!(user_id = %owner, count = updates.len(), "Updating site credential secrets");
        // Rolls back on drop unless committed.
        let tx = self.conn.unchecked_transaction().map_err(storage_error)?;
        for (id, secret) in updates {
            set_credential_secret(&tx, *id, owner, secret)?;
        }
        tx.commit().map_err(storage_error)
    }

    fn update_site_credential_username(
        &self,
        id: CredentialId,
        owner: UserId,
        site_username: &str,
    ) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE passwords SET username = ?1 WHERE id = ?2 AND user_id = ?3",
                params![site_username, id.0, owner.0],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("credential {}", id))
    }

    fn update_site_username(
        &self,
        owner: UserId,
        site: &str,
        site_username: &str,
    ) -> Result<usize> {
        let changed = self
            .conn
            .execute(
                "UPDATE passwords SET username = ?1 WHERE user_id = ?2 AND website = ?3",
                params![site_username, owner.0, site],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("website '{}'", site))?;
        Ok(changed)
    }

    fn delete_site_credential(&self, id: CredentialId, owner: UserId) -> Result<()> {
        debug!(user_id = %owner, credential_id = %id, "Deleting site credential");
        let changed = self
            .conn
            .execute(
                "DELETE FROM passwords WHERE id = ?1 AND user_id = ?2",
                params![id.0, owner.0],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("credential {}", id))
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            users: self.count("users")?,
            credentials: self.count("passwords")?,
        })
    }
}

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<SiteCredential> {
    Ok(SiteCredential {
        id: CredentialId(row.get(0)?),
        owner: UserId(row.get(1)?),
        site: row.get(2)?,
        site_username: row.get(3)?,
        secret: Envelope::from_encoded(row.get::<_, String>(4)?),
    })
}

fn set_credential_secret(
    conn: &Connection,
    id: CredentialId,
    owner: UserId,
    secret: &Envelope,
) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE passwords SET password = ?1 WHERE id = ?2 AND user_id = ?3",
            params![secret.as_str(), id.0, owner.0],
        )
        .map_err(storage_error)?;
    require_changed(changed, || format!("credential {}", id))
}

fn has_extended_code(err: &rusqlite::Error, code: i32) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.extended_code == code)
}

fn require_changed(changed: usize, what: impl FnOnce() -> String) -> Result<()> {
    if changed == 0 {
        Err(Error::NotFound(what()))
    } else {
        Ok(())
    }
}

fn storage_error(err: rusqlite::Error) -> Error {
    Error::Storage(err.to_string())
}
