//! Common types used throughout PassVault.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Identifier of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stored site credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialId(pub i64);

impl CredentialId {
    /// Parse a credential id typed by the user.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if the text is not an integer
    pub fn parse(input: &str) -> crate::Result<Self> {
        input
            .trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| crate::Error::InvalidInput(format!("'{}' is not a valid ID", input.trim())))
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ciphertext envelope as persisted in the database.
///
/// The content is opaque outside the crypto crate: nonce, ciphertext and
/// authentication tag in an encoded text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope(String);

impl Envelope {
    /// Wrap encoded envelope text read from storage.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Get the encoded text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext secret that zeroizes on drop and never prints its content.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretText(String);

impl SecretText {
    /// Take ownership of a plaintext secret.
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Reveal the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for SecretText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretText([REDACTED])")
    }
}
