//! User-facing vault operations.
//!
//! Every operation other than registration starts with a fresh login.
//! A rejected login aborts the operation before anything is read or written.

use tracing::{debug, info, warn};

use crate::auth::AuthGate;
use crate::session::Session;
use passvault_common::{CredentialId, Error, Result, SecretText, UserId};
use passvault_crypto::{Cipher, PasswordGenerator};
use passvault_storage::{CredentialStore, SiteCredential};

/// Name and secret presented for a gated operation.
#[derive(Clone, Copy)]
pub struct Login<'a> {
    pub name: &'a str,
    pub secret: &'a str,
}

impl<'a> Login<'a> {
    pub fn new(name: &'a str, secret: &'a str) -> Self {
        Self { name, secret }
    }
}

impl std::fmt::Debug for Login<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("name", &self.name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Result of an operation that accepted secret input.
///
/// `generated` holds the password substituted for blank input. It is only
/// ever returned here; afterwards it exists solely as an envelope.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub generated: Option<SecretText>,
}

/// A site credential with its secret decrypted.
#[derive(Debug, Clone)]
pub struct RevealedCredential {
    pub id: CredentialId,
    pub site: String,
    pub site_username: String,
    /// `None` if the stored envelope could not be decrypted.
    pub secret: Option<SecretText>,
}

/// The vault: a credential store, the cipher protecting it, and the
/// generator used for blank secrets.
pub struct VaultService<S> {
    store: S,
    cipher: Cipher,
    generator: PasswordGenerator,
}

impl<S: CredentialStore> VaultService<S> {
    /// Assemble a vault from its parts.
    pub fn new(store: S, cipher: Cipher, generator: PasswordGenerator) -> Self {
        Self {
            store,
            cipher,
            generator,
        }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn gate(&self) -> AuthGate<'_, S> {
        AuthGate::new(&self.store, &self.cipher)
    }

    /// Use `input` as the secret, or generate one if it is blank.
    fn secret_or_generated(&self, input: &str) -> (SecretText, bool) {
        if input.trim().is_empty() {
            (self.generator.generate(), true)
        } else {
            (SecretText::new(input.to_string()), false)
        }
    }

    fn outcome<T>(value: T, secret: SecretText, generated: bool) -> Outcome<T> {
        Outcome {
            value,
            generated: generated.then_some(secret),
        }
    }

    /// Verify a login without doing anything else.
    pub fn login(&self, login: &Login<'_>) -> Result<Session> {
        self.gate().verify(login.name, login.secret)
    }

    /// Register a new user.
    ///
    /// # Errors
    /// - `InvalidInput` if `name` is blank
    /// - `DuplicateUser` if `name` is taken; the existing user is untouched
    pub fn register(&self, name: &str, secret: &str) -> Result<Outcome<UserId>> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("Name cannot be empty".to_string()));
        }
        debug!(name = %name, "Registering user");

        let (secret, generated) = self.secret_or_generated(secret);
        let envelope = self.cipher.encrypt(secret.expose().as_bytes())?;
        let user_id = self.store.create_user(name, &envelope)?;

        info!(user_id = %user_id, generated, "User registered");
        Ok(Self::outcome(user_id, secret, generated))
    }

    /// Replace the login secret of the authenticated user.
    pub fn change_login_secret(&self, login: &Login<'_>, new_secret: &str) -> Result<Outcome<()>> {
        let session = self.login(login)?;

        let (secret, generated) = self.secret_or_generated(new_secret);
        let envelope = self.cipher.encrypt(secret.expose().as_bytes())?;
        self.store.update_user_secret(session.user_id(), &envelope)?;

        info!(user_id = %session.user_id(), generated, "Login secret changed");
        Ok(Self::outcome((), secret, generated))
    }

    /// Store a credential for a website.
    ///
    /// # Errors
    /// - `InvalidInput` if `site` is blank
    pub fn add_site_credential(
        &self,
        login: &Login<'_>,
        site: &str,
        site_username: &str,
        secret: &str,
    ) -> Result<Outcome<CredentialId>> {
        let session = self.login(login)?;
        if site.trim().is_empty() {
            return Err(Error::InvalidInput("Website cannot be empty".to_string()));
        }

        let (secret, generated) = self.secret_or_generated(secret);
        let envelope = self.cipher.encrypt(secret.expose().as_bytes())?;
        let id = self
            .store
            .create_site_credential(session.user_id(), site, site_username, &envelope)?;

        info!(user_id = %session.user_id(), credential_id = %id, site = %site, "Credential added");
        Ok(Self::outcome(id, secret, generated))
    }

    /// Credentials of the authenticated user for `site`, or `NotFound`.
    fn matching_site(&self, session: &Session, site: &str) -> Result<Vec<SiteCredential>> {
        let matches = self
            .store
            .find_site_credentials_by_site(session.user_id(), site)?;
        if matches.is_empty() {
            return Err(Error::NotFound(format!("website '{}'", site)));
        }
        Ok(matches)
    }

    /// Replace the secret of every credential the user holds for `site`.
    ///
    /// All entries for the site receive the same secret, each under its own
    /// envelope, and are written together. Returns the number of entries
    /// updated.
    ///
    /// # Errors
    /// - `NotFound` if the user has no credential for `site`; nothing is
    ///   generated or written in that case
    pub fn change_site_secret(
        &self,
        login: &Login<'_>,
        site: &str,
        new_secret: &str,
    ) -> Result<Outcome<usize>> {
        let session = self.login(login)?;
        let matches = self.matching_site(&session, site)?;

        let (secret, generated) = self.secret_or_generated(new_secret);
        let updates = matches
            .iter()
            .map(|credential| {
                let envelope = self.cipher.encrypt(secret.expose().as_bytes())?;
                Ok((credential.id, envelope))
            })
            .collect::<Result<Vec<_>>>()?;
        self.store
            .update_site_credential_secrets(session.user_id(), &updates)?;

        info!(user_id = %session.user_id(), site = %site, updated = matches.len(), "Site secret changed");
        Ok(Self::outcome(matches.len(), secret, generated))
    }

    /// Replace the username of every credential the user holds for `site`.
    ///
    /// # Errors
    /// - `NotFound` if the user has no credential for `site`
    pub fn change_site_username(
        &self,
        login: &Login<'_>,
        site: &str,
        new_username: &str,
    ) -> Result<usize> {
        let session = self.login(login)?;
        let updated = self
            .store
            .update_site_username(session.user_id(), site, new_username)?;

        info!(user_id = %session.user_id(), site = %site, updated, "Site username changed");
        Ok(updated)
    }

    /// All credentials of the authenticated user, decrypted.
    ///
    /// A credential whose envelope fails to decrypt is still listed, with
    /// `secret` set to `None`.
    pub fn list_credentials(&self, login: &Login<'_>) -> Result<Vec<RevealedCredential>> {
        let session = self.login(login)?;

        let credentials = self.store.list_site_credentials(session.user_id())?;
        let revealed = credentials
            .into_iter()
            .map(|credential| {
                let secret = match self.cipher.decrypt_string(&credential.secret) {
                    Ok(secret) => Some(secret),
                    Err(e) => {
                        warn!(
                            credential_id = %credential.id,
                            error = %e,
                            "Stored credential failed integrity check"
                        );
                        None
                    }
                };
                RevealedCredential {
                    id: credential.id,
                    site: credential.site,
                    site_username: credential.site_username,
                    secret,
                }
            })
            .collect::<Vec<_>>();

        debug!(user_id = %session.user_id(), count = revealed.len(), "Credentials listed");
        Ok(revealed)
    }

    /// Delete one of the authenticated user's credentials.
    ///
    /// # Errors
    /// - `NotFound` if `id` does not exist or belongs to another user
    pub fn delete_credential(&self, login: &Login<'_>, id: CredentialId) -> Result<()> {
        let session = self.login(login)?;

        let owned = self
            .store
            .list_site_credentials(session.user_id())?
            .iter()
            .any(|credential| credential.id == id);
        if !owned {
            return Err(Error::NotFound(format!("credential {}", id)));
        }

        self.store.delete_site_credential(id, session.user_id())?;
        info!(user_id = %session.user_id(), credential_id = %id, "Credential deleted");
        Ok(())
    }

    /// Delete the authenticated user and all of their credentials.
    ///
    /// Returns the number of credentials removed with the account.
    pub fn delete_account(&self, login: &Login<'_>) -> Result<usize> {
        let session = self.login(login)?;

        let removed = self.store.list_site_credentials(session.user_id())?.len();
        self.store.delete_user(session.user_id())?;

        info!(user_id = %session.user_id(), removed, "Account deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passvault_common::{Envelope, RejectReason};
    use passvault_crypto::{generator::ALPHABET, MasterKey, KEY_LENGTH};
    use passvault_storage::{SqliteStore, StoreStats};
    use proptest::prelude::*;

    const ALICE: Login<'static> = Login {
        name: "alice",
        secret: "Secr3t!",
    };
    const BOB: Login<'static> = Login {
        name: "bob",
        secret: "b0b-pass",
    };

    fn vault() -> VaultService<SqliteStore> {
        VaultService::new(
            SqliteStore::in_memory().unwrap(),
            Cipher::new(MasterKey::from_bytes([11u8; KEY_LENGTH])),
            PasswordGenerator::default(),
        )
    }

    fn vault_with_alice() -> VaultService<SqliteStore> {
        let vault = vault();
        vault.register(ALICE.name, ALICE.secret).unwrap();
        vault
    }

    fn is_rejected(result: Result<impl std::fmt::Debug>) -> bool {
        matches!(result, Err(Error::AuthenticationRejected(_)))
    }

    #[test]
    fn test_register_then_login() {
        let vault = vault_with_alice();

        let session = vault.login(&ALICE).unwrap();
        assert_eq!(session.name(), "alice");

        let err = vault.login(&Login::new("alice", "wrong")).unwrap_err();
        assert!(matches!(
            err,
            Error::AuthenticationRejected(RejectReason::WrongSecret)
        ));

        let err = vault.login(&Login::new("carol", "Secr3t!")).unwrap_err();
        assert!(matches!(
            err,
            Error::AuthenticationRejected(RejectReason::UnknownUser)
        ));
    }

    #[test]
    fn test_register_stores_only_ciphertext() {
        let vault = vault_with_alice();

        let user = vault.store().find_user_by_name("alice").unwrap().unwrap();
        assert!(!user.secret.as_str().contains("Secr3t!"));
    }

    #[test]
    fn test_register_blank_secret_is_generated() {
        let vault = vault();

        let outcome = vault.register("dave", "   ").unwrap();
        let generated = outcome.generated.expect("blank secret should be generated");
        assert_eq!(generated.char_count(), 12);

        vault
            .login(&Login::new("dave", generated.expose()))
            .unwrap();
        assert!(is_rejected(vault.login(&Login::new("dave", "   "))));
    }

    #[test]
    fn test_register_supplied_secret_is_not_echoed() {
        let outcome = vault().register("erin", "hunter2").unwrap();
        assert!(outcome.generated.is_none());
    }

    #[test]
    fn test_duplicate_registration() {
        let vault = vault_with_alice();

        let err = vault.register("alice", "other").unwrap_err();
        assert!(matches!(err, Error::DuplicateUser(_)));

        // Original secret still works, the attempted one does not.
        vault.login(&ALICE).unwrap();
        assert!(is_rejected(vault.login(&Login::new("alice", "other"))));
    }

    #[test]
    fn test_register_blank_name() {
        assert!(matches!(
            vault().register("  ", "x"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_change_login_secret() {
        let vault = vault_with_alice();

        let outcome = vault.change_login_secret(&ALICE, "N3w-secret").unwrap();
        assert!(outcome.generated.is_none());

        assert!(is_rejected(vault.login(&ALICE)));
        vault.login(&Login::new("alice", "N3w-secret")).unwrap();
    }

    #[test]
    fn test_change_login_secret_generated() {
        let vault = vault_with_alice();

        let generated = vault
            .change_login_secret(&ALICE, "")
            .unwrap()
            .generated
            .unwrap();
        vault
            .login(&Login::new("alice", generated.expose()))
            .unwrap();
    }

    #[test]
    fn test_gated_operations_reject_bad_login() {
        let vault = vault_with_alice();
        let id = vault
            .add_site_credential(&ALICE, "example.com", "alice99", "pw")
            .unwrap()
            .value;
        let bad = Login::new("alice", "wrong");
        let before = vault.store().stats().unwrap();

        assert!(is_rejected(vault.change_login_secret(&bad, "x")));
        assert!(is_rejected(vault.add_site_credential(&bad, "s", "u", "p")));
        assert!(is_rejected(vault.change_site_secret(&bad, "example.com", "x")));
        assert!(is_rejected(vault.change_site_username(&bad, "example.com", "x")));
        assert!(is_rejected(vault.list_credentials(&bad)));
        assert!(is_rejected(vault.delete_credential(&bad, id)));
        assert!(is_rejected(vault.delete_account(&bad)));

        assert_eq!(vault.store().stats().unwrap(), before);
        let listed = vault.list_credentials(&ALICE).unwrap();
        assert_eq!(listed[0].secret.as_ref().unwrap().expose(), "pw");
        vault.login(&ALICE).unwrap();
    }

    #[test]
    fn test_add_with_generated_secret_and_list() {
        let vault = vault_with_alice();

        let outcome = vault
            .add_site_credential(&ALICE, "example.com", "alice99", "")
            .unwrap();
        let generated = outcome.generated.unwrap();
        assert_eq!(generated.char_count(), 12);
        assert!(generated.expose().bytes().all(|c| ALPHABET.contains(&c)));

        let listed = vault.list_credentials(&ALICE).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, outcome.value);
        assert_eq!(listed[0].site, "example.com");
        assert_eq!(listed[0].site_username, "alice99");
        assert_eq!(listed[0].secret.as_ref().unwrap(), &generated);
    }

    #[test]
    fn test_add_blank_site() {
        let vault = vault_with_alice();
        assert!(matches!(
            vault.add_site_credential(&ALICE, "", "u", "p"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_change_secret_for_missing_site() {
        let vault = vault_with_alice();
        vault
            .add_site_credential(&ALICE, "example.com", "alice99", "keep-me")
            .unwrap();

        let err = vault
            .change_site_secret(&ALICE, "nonexistent.com", "")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let listed = vault.list_credentials(&ALICE).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].site, "example.com");
        assert_eq!(listed[0].secret.as_ref().unwrap().expose(), "keep-me");
    }

    #[test]
    fn test_change_site_secret_updates_every_entry_for_site() {
        let vault = vault_with_alice();
        vault
            .add_site_credential(&ALICE, "example.com", "main", "one")
            .unwrap();
        vault
            .add_site_credential(&ALICE, "example.com", "alt", "two")
            .unwrap();
        vault
            .add_site_credential(&ALICE, "other.org", "x", "three")
            .unwrap();

        let outcome = vault
            .change_site_secret(&ALICE, "example.com", "shared")
            .unwrap();
        assert_eq!(outcome.value, 2);

        let listed = vault.list_credentials(&ALICE).unwrap();
        let secrets: Vec<_> = listed
            .iter()
            .map(|c| c.secret.as_ref().unwrap().expose().to_string())
            .collect();
        assert_eq!(secrets, vec!["shared", "shared", "three"]);

        // Each row got its own envelope.
        let owner = vault.login(&ALICE).unwrap().user_id();
        let rows = vault
            .store()
            .find_site_credentials_by_site(owner, "example.com")
            .unwrap();
        assert_ne!(rows[0].secret, rows[1].secret);
    }

    #[test]
    fn test_change_site_username() {
        let vault = vault_with_alice();
        vault
            .add_site_credential(&ALICE, "example.com", "alice99", "pw")
            .unwrap();

        assert_eq!(
            vault
                .change_site_username(&ALICE, "example.com", "alice100")
                .unwrap(),
            1
        );
        let listed = vault.list_credentials(&ALICE).unwrap();
        assert_eq!(listed[0].site_username, "alice100");
        assert_eq!(listed[0].secret.as_ref().unwrap().expose(), "pw");

        assert!(matches!(
            vault.change_site_username(&ALICE, "nonexistent.com", "x"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_credential_twice() {
        let vault = vault_with_alice();
        let keep = vault
            .add_site_credential(&ALICE, "keep.test", "a", "1")
            .unwrap()
            .value;
        let gone = vault
            .add_site_credential(&ALICE, "gone.test", "a", "2")
            .unwrap()
            .value;

        vault.delete_credential(&ALICE, gone).unwrap();
        let ids: Vec<_> = vault
            .list_credentials(&ALICE)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![keep]);

        assert!(matches!(
            vault.delete_credential(&ALICE, gone),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_users_cannot_touch_each_others_credentials() {
        let vault = vault_with_alice();
        vault.register(BOB.name, BOB.secret).unwrap();
        let bobs = vault
            .add_site_credential(&BOB, "bank.test", "bob", "bob-secret")
            .unwrap()
            .value;

        assert!(matches!(
            vault.delete_credential(&ALICE, bobs),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            vault.change_site_secret(&ALICE, "bank.test", "stolen"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            vault.change_site_username(&ALICE, "bank.test", "mallory"),
            Err(Error::NotFound(_))
        ));
        assert!(vault.list_credentials(&ALICE).unwrap().is_empty());

        let listed = vault.list_credentials(&BOB).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].site_username, "bob");
        assert_eq!(listed[0].secret.as_ref().unwrap().expose(), "bob-secret");
    }

    #[test]
    fn test_corrupt_credential_is_listed_without_secret() {
        let vault = vault_with_alice();
        let session = vault.login(&ALICE).unwrap();
        let good = vault
            .add_site_credential(&ALICE, "good.test", "a", "fine")
            .unwrap()
            .value;
        let bad = vault
            .store()
            .create_site_credential(
                session.user_id(),
                "bad.test",
                "a",
                &Envelope::from_encoded("not-an-envelope"),
            )
            .unwrap();

        let listed = vault.list_credentials(&ALICE).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, good);
        assert_eq!(listed[0].secret.as_ref().unwrap().expose(), "fine");
        assert_eq!(listed[1].id, bad);
        assert!(listed[1].secret.is_none());
    }

    #[test]
    fn test_delete_account_cascades() {
        let vault = vault_with_alice();
        vault.register(BOB.name, BOB.secret).unwrap();
        vault.add_site_credential(&ALICE, "a.test", "a", "1").unwrap();
        vault.add_site_credential(&ALICE, "b.test", "a", "2").unwrap();
        vault.add_site_credential(&BOB, "a.test", "b", "3").unwrap();

        assert_eq!(vault.delete_account(&ALICE).unwrap(), 2);

        assert_eq!(
            vault.store().stats().unwrap(),
            StoreStats {
                users: 1,
                credentials: 1
            }
        );
        assert!(matches!(
            vault.login(&ALICE),
            Err(Error::AuthenticationRejected(RejectReason::UnknownUser))
        ));
        // The name is free again.
        vault.register("alice", "fresh").unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_any_non_blank_secret_logs_in(secret in "\\PC*[^\\s]\\PC*") {
            let vault = vault();
            vault.register("user", &secret).unwrap();
            prop_assert!(vault.login(&Login::new("user", &secret)).is_ok());
        }
    }
}
