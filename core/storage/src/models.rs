//! Rows stored in the credential database.

use passvault_common::{CredentialId, Envelope, UserId};

/// A registered vault user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    /// Encrypted login secret.
    pub secret: Envelope,
}

/// A website credential owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteCredential {
    pub id: CredentialId,
    pub owner: UserId,
    pub site: String,
    /// Stored in plaintext.
    pub site_username: String,
    /// Encrypted site secret.
    pub secret: Envelope,
}

/// Row counts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub users: u64,
    pub credentials: u64,
}
