//! Credential store trait definition.

use crate::models::{SiteCredential, StoreStats, User};
use passvault_common::{CredentialId, Envelope, Result, UserId};

/// Durable storage of users and their site credentials.
///
/// Implementations enforce referential integrity: every credential belongs
/// to an existing user, and removing a user removes its credentials.
/// Every mutating call commits before it returns.
///
/// Credential operations take the owner's id and only ever touch rows
/// belonging to that owner. An id owned by someone else is reported as
/// `NotFound`, exactly like an id that does not exist.
pub trait CredentialStore {
    /// Insert a new user.
    ///
    /// # Errors
    /// - `DuplicateUser` if `name` is already registered
    fn create_user(&self, name: &str, secret: &Envelope) -> Result<UserId>;

    /// Look up a user by exact, case-sensitive name.
    fn find_user_by_name(&self, name: &str) -> Result<Option<User>>;

    /// Replace a user's encrypted login secret.
    ///
    /// # Errors
    /// - `NotFound` if the user does not exist
    fn update_user_secret(&self, user_id: UserId, secret: &Envelope) -> Result<()>;

    /// Remove a user together with all of its credentials.
    ///
    /// # Errors
    /// - `NotFound` if the user does not exist
    fn delete_user(&self, user_id: UserId) -> Result<()>;

    /// Insert a credential for `owner`.
    ///
    /// # Errors
    /// - `NotFound` if `owner` does not exist
    fn create_site_credential(
        &self,
        owner: UserId,
        site: &str,
        site_username: &str,
        secret: &Envelope,
    ) -> Result<CredentialId>;

    /// All credentials of `owner`, ordered by id.
    fn list_site_credentials(&self, owner: UserId) -> Result<Vec<SiteCredential>>;

    /// Credentials of `owner` for exactly `site`, ordered by id.
    fn find_site_credentials_by_site(&self, owner: UserId, site: &str)
        -> Result<Vec<SiteCredential>>;

    /// Replace the encrypted secret of one of `owner`'s credentials.
    fn update_site_credential_secret(
        &self,
        id: CredentialId,
        owner: UserId,
        secret: &Envelope,
    ) -> Result<()>;

    /// Replace the encrypted secrets of several of `owner`'s credentials.
    ///
    /// All updates commit together or not at all.
    ///
    /// # Errors
    /// - `NotFound` if any id does not belong to `owner`; nothing is changed
    fn update_site_credential_secrets(
        &self,
        owner: UserId,
        updates: &[(CredentialId, Envelope)],
    ) -> Result<()>;

    /// Replace the username of one of `owner`'s credentials.
    fn update_site_credential_username(
        &self,
        id: CredentialId,
        owner: UserId,
        site_username: &str,
    ) -> Result<()>;

    /// Replace the username of every credential `owner` holds for `site`.
    ///
    /// Returns the number of credentials updated.
    ///
    /// # Errors
    /// - `NotFound` if `owner` has no credential for `site`
    fn update_site_username(&self, owner: UserId, site: &str, site_username: &str)
        -> Result<usize>;

    /// Delete one of `owner`'s credentials.
    fn delete_site_credential(&self, id: CredentialId, owner: UserId) -> Result<()>;

    /// Row counts.
    fn stats(&self) -> Result<StoreStats>;
}
