//! Authenticated encryption using XChaCha20-Poly1305.
//!
//! XChaCha20-Poly1305 provides both confidentiality and authenticity,
//! with a 24-byte nonce that is safe for random generation.
//!
//! Sealed data layout: `version || nonce || ciphertext || tag`.

use chacha20poly1305::{
    aead::{generic_array::GenericArray, Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305,
};

use crate::keys::KEY_LENGTH;
use passvault_common::{Error, Result};

/// Envelope format version written by [`seal`].
pub const ENVELOPE_VERSION: u8 = 1;

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Bytes added to the plaintext by [`seal`].
pub const OVERHEAD: usize = 1 + NONCE_SIZE + TAG_SIZE;

/// Encrypt plaintext under `key` with a fresh random nonce.
///
/// # Postconditions
/// - Returns version || nonce || ciphertext || tag
/// - Output length is plaintext length + OVERHEAD
///
/// # Errors
/// - Returns `Crypto` if the cipher reports a failure
pub fn seal(key: &[u8; KEY_LENGTH], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key));
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    let mut sealed = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
    sealed.push(ENVELOPE_VERSION);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    Ok(sealed)
}

/// Verify and decrypt data produced by [`seal`].
///
/// # Errors
/// - `Decryption` if the data is too short or has an unknown version
/// - `Decryption` if authentication fails (tampered data or wrong key)
pub fn open(key: &[u8; KEY_LENGTH], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < OVERHEAD {
        return Err(Error::Decryption("Envelope too short".to_string()));
    }

    let (version, rest) = sealed.split_at(1);
    if version[0] != ENVELOPE_VERSION {
        return Err(Error::Decryption(format!(
            "Unsupported envelope version: {}",
            version[0]
        )));
    }

    let (nonce_bytes, encrypted) = rest.split_at(NONCE_SIZE);
    let nonce = GenericArray::from_slice(nonce_bytes);

    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key));

    cipher
        .decrypt(nonce, encrypted)
        .map_err(|_| Error::Decryption("Authentication tag mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = [42u8; KEY_LENGTH];
        let plaintext = b"Hello, World!";

        let sealed = seal(&key, plaintext).unwrap();
        let opened = open(&key, &sealed).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_sealed_size() {
        let key = [42u8; KEY_LENGTH];
        let plaintext = b"Test message";

        let sealed = seal(&key, plaintext).unwrap();

        assert_eq!(sealed.len(), OVERHEAD + plaintext.len());
        assert_eq!(sealed[0], ENVELOPE_VERSION);
    }

    #[test]
    fn test_different_nonce_each_time() {
        let key = [42u8; KEY_LENGTH];
        let plaintext = b"Same plaintext";

        let s1 = seal(&key, plaintext).unwrap();
        let s2 = seal(&key, plaintext).unwrap();

        assert_ne!(&s1[1..1 + NONCE_SIZE], &s2[1..1 + NONCE_SIZE]);
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = seal(&[1u8; KEY_LENGTH], b"Secret data").unwrap();
        let result = open(&[2u8; KEY_LENGTH], &sealed);

        assert!(matches!(result, Err(Error::Decryption(_))));
    }

    #[test]
    fn test_truncated_fails() {
        let key = [42u8; KEY_LENGTH];
        let sealed = seal(&key, b"").unwrap();

        assert!(open(&key, &sealed[..sealed.len() - 1]).is_err());
        assert!(open(&key, &[]).is_err());
    }

    #[test]
    fn test_unknown_version_fails() {
        let key = [42u8; KEY_LENGTH];
        let mut sealed = seal(&key, b"data").unwrap();
        sealed[0] = 9;

        let err = open(&key, &sealed).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = [42u8; KEY_LENGTH];

        let sealed = seal(&key, b"").unwrap();
        assert!(open(&key, &sealed).unwrap().is_empty());
    }
}
