//! Login verification against stored, encrypted user secrets.

use tracing::{debug, warn};

use crate::session::{AuthState, Session};
use passvault_common::{RejectReason, Result};
use passvault_crypto::{secrets_match, Cipher};
use passvault_storage::CredentialStore;

/// Verifies a claimed name and secret.
///
/// Holds no state between calls: every attempt reads the user record,
/// decrypts its secret and compares it in constant time.
pub struct AuthGate<'a, S: ?Sized> {
    store: &'a S,
    cipher: &'a Cipher,
}

impl<'a, S: CredentialStore + ?Sized> AuthGate<'a, S> {
    /// Create a gate over a store and the cipher its secrets were sealed with.
    pub fn new(store: &'a S, cipher: &'a Cipher) -> Self {
        Self { store, cipher }
    }

    /// Run one login attempt to a terminal state.
    ///
    /// # Postconditions
    /// - Returns `Authenticated` or `Rejected`, never an intermediate state
    /// - Unknown names, wrong secrets and undecryptable records are
    ///   rejections, not errors
    ///
    /// # Errors
    /// - `Storage` if the user record cannot be read
    pub fn attempt(&self, name: &str, secret: &str) -> Result<AuthState> {
        let state = AuthState::Anonymous.begin();
        debug!(name = %name, "Authenticating");

        let outcome = self.check(name, secret)?;
        if let Err(reason) = &outcome {
            warn!(name = %name, reason = %reason, "Login rejected");
        }

        Ok(state.resolve(outcome))
    }

    /// Verify credentials, returning a session or an `AuthenticationRejected` error.
    pub fn verify(&self, name: &str, secret: &str) -> Result<Session> {
        self.attempt(name, secret)?.into_session()
    }

    fn check(&self, name: &str, secret: &str) -> Result<std::result::Result<Session, RejectReason>> {
        let Some(user) = self.store.find_user_by_name(name)? else {
            return Ok(Err(RejectReason::UnknownUser));
        };

        let stored = match self.cipher.decrypt(&user.secret) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(user_id = %user.user_id, error = %e, "Stored login secret is unreadable");
                return Ok(Err(RejectReason::CorruptRecord));
            }
        };

        if secrets_match(&stored, secret.as_bytes()) {
            Ok(Ok(Session::new(user.user_id, user.name)))
        } else {
            Ok(Err(RejectReason::WrongSecret))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passvault_common::{Envelope, Error};
    use passvault_crypto::{MasterKey, KEY_LENGTH};
    use passvault_storage::SqliteStore;

    fn setup() -> (SqliteStore, Cipher) {
        let store = SqliteStore::in_memory().unwrap();
        let cipher = Cipher::new(MasterKey::from_bytes([3u8; KEY_LENGTH]));
        let sealed = cipher.encrypt(b"Secr3t!").unwrap();
        store.create_user("alice", &sealed).unwrap();
        (store, cipher)
    }

    #[test]
    fn test_correct_secret_authenticates() {
        let (store, cipher) = setup();
        let gate = AuthGate::new(&store, &cipher);

        let session = gate.verify("alice", "Secr3t!").unwrap();
        assert_eq!(session.name(), "alice");
        assert_eq!(
            session.user_id(),
            store.find_user_by_name("alice").unwrap().unwrap().user_id
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (store, cipher) = setup();
        let gate = AuthGate::new(&store, &cipher);

        for claimed in ["wrong", "Secr3t", "Secr3t!!", "secr3t!", ""] {
            assert_eq!(
                gate.attempt("alice", claimed).unwrap(),
                AuthState::Rejected(RejectReason::WrongSecret)
            );
        }
    }

    #[test]
    fn test_unknown_user_rejected() {
        let (store, cipher) = setup();
        let gate = AuthGate::new(&store, &cipher);

        let err = gate.verify("bob", "Secr3t!").unwrap_err();
        assert!(matches!(
            err,
            Error::AuthenticationRejected(RejectReason::UnknownUser)
        ));
    }

    #[test]
    fn test_corrupt_record_rejected() {
        let (store, cipher) = setup();
        let user = store.find_user_by_name("alice").unwrap().unwrap();
        store
            .update_user_secret(user.user_id, &Envelope::from_encoded("garbage"))
            .unwrap();
        let gate = AuthGate::new(&store, &cipher);

        assert_eq!(
            gate.attempt("alice", "Secr3t!").unwrap(),
            AuthState::Rejected(RejectReason::CorruptRecord)
        );
    }

    #[test]
    fn test_other_key_is_corrupt_record() {
        let (store, _) = setup();
        let other = Cipher::new(MasterKey::from_bytes([4u8; KEY_LENGTH]));
        let gate = AuthGate::new(&store, &other);

        assert_eq!(
            gate.attempt("alice", "Secr3t!").unwrap(),
            AuthState::Rejected(RejectReason::CorruptRecord)
        );
    }
}
