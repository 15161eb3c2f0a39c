//! Envelope cipher bound to the vault's master key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::aead::{open, seal};
use crate::keys::MasterKey;
use passvault_common::{Envelope, Error, Result, SecretText};

/// Encrypts and decrypts credential fields under one master key.
///
/// Holds no state besides the key, so a single instance can be shared by
/// every caller for the lifetime of the vault.
#[derive(Debug, Clone)]
pub struct Cipher {
    key: MasterKey,
}

impl Cipher {
    /// Create a cipher for the given master key.
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// Encrypt plaintext into a storable envelope.
    ///
    /// Two calls with the same plaintext produce different envelopes.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Envelope> {
        let sealed = seal(self.key.as_bytes(), plaintext)?;
        Ok(Envelope::from_encoded(STANDARD.encode(sealed)))
    }

    /// Decrypt an envelope.
    ///
    /// # Errors
    /// - `Decryption` if the envelope is not valid base64
    /// - `Decryption` if it was tampered with or sealed under another key
    pub fn decrypt(&self, envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>> {
        let sealed = STANDARD
            .decode(envelope.as_str())
            .map_err(|e| Error::Decryption(format!("Malformed envelope: {}", e)))?;
        open(self.key.as_bytes(), &sealed).map(Zeroizing::new)
    }

    /// Decrypt an envelope holding UTF-8 text.
    pub fn decrypt_string(&self, envelope: &Envelope) -> Result<SecretText> {
        let plaintext = self.decrypt(envelope)?;
        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| Error::Decryption("Plaintext is not valid UTF-8".to_string()))?;
        Ok(SecretText::new(text.to_owned()))
    }
}

/// Compare two secrets in constant time.
///
/// Only the lengths may leak through timing, never the position of the
/// first differing byte.
pub fn secrets_match(stored: &[u8], claimed: &[u8]) -> bool {
    stored.ct_eq(claimed).into()
}
