//! Common error types for PassVault.

use std::fmt;

use thiserror::Error;

/// Why an authentication attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No user with the claimed name exists.
    UnknownUser,
    /// The stored secret does not match the claimed one.
    WrongSecret,
    /// The stored secret could not be decrypted.
    CorruptRecord,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnknownUser => write!(f, "user does not exist"),
            RejectReason::WrongSecret => write!(f, "wrong password"),
            RejectReason::CorruptRecord => write!(f, "stored credential is corrupt"),
        }
    }
}

/// Top-level error type for PassVault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Key file could not be read, written or parsed.
    #[error("Key file error: {0}")]
    KeyFile(String),

    /// Encryption failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Envelope was malformed, tampered with, or sealed under another key.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// A user with this name is already registered.
    #[error("User already exists: {0}")]
    DuplicateUser(String),

    /// Login was refused.
    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(RejectReason),

    /// Resource not found, or not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error can be reported to the user and the session continued.
    ///
    /// Key file, storage and configuration failures are fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Decryption(_)
                | Error::DuplicateUser(_)
                | Error::AuthenticationRejected(_)
                | Error::NotFound(_)
                | Error::InvalidInput(_)
        )
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
