//! Authenticated sessions and the login state machine.
//!
//! A session is proof that a name and secret were verified. It lives only
//! as long as the operation that asked for it and is never persisted.

use passvault_common::{Error, RejectReason, Result, UserId};

/// Identity established by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    name: String,
}

impl Session {
    pub(crate) fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
        }
    }

    /// Id of the authenticated user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Name of the authenticated user.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// State of a single login attempt.
///
/// `Anonymous -> Authenticating -> {Authenticated, Rejected}`. Both final
/// states are terminal; a new attempt starts again from `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No credentials presented yet.
    Anonymous,
    /// Credentials presented, verification in progress.
    Authenticating,
    /// Credentials verified.
    Authenticated(Session),
    /// Credentials refused.
    Rejected(RejectReason),
}

impl AuthState {
    /// Start verifying. Only valid from `Anonymous`; other states are kept.
    pub(crate) fn begin(self) -> Self {
        match self {
            AuthState::Anonymous => AuthState::Authenticating,
            other => other,
        }
    }

    /// Record the verification outcome. Only valid from `Authenticating`.
    pub(crate) fn resolve(self, outcome: std::result::Result<Session, RejectReason>) -> Self {
        match self {
            AuthState::Authenticating => match outcome {
                Ok(session) => AuthState::Authenticated(session),
                Err(reason) => AuthState::Rejected(reason),
            },
            other => other,
        }
    }

    /// Check if the attempt has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthState::Authenticated(_) | AuthState::Rejected(_))
    }

    /// Convert a finished attempt into a session or a rejection error.
    pub fn into_session(self) -> Result<Session> {
        match self {
            AuthState::Authenticated(session) => Ok(session),
            AuthState::Rejected(reason) => Err(Error::AuthenticationRejected(reason)),
            AuthState::Anonymous | AuthState::Authenticating => Err(Error::InvalidInput(
                "Authentication has not completed".to_string(),
            )),
        }
    }
}
