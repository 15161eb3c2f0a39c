//! Random password generation.

use rand::{rngs::OsRng, Rng};

use passvault_common::{Error, Result, SecretText};

/// Length used when no explicit length is configured.
pub const DEFAULT_LENGTH: usize = 12;

/// Characters a generated password is drawn from: ASCII letters, digits and
/// punctuation.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
abcdefghijklmnopqrstuvwxyz\
0123456789\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Generates passwords of a fixed length from [`ALPHABET`].
///
/// Every character is drawn independently and uniformly using the operating
/// system's CSPRNG.
#[derive(Debug, Clone, Copy)]
pub struct PasswordGenerator {
    length: usize,
}

impl PasswordGenerator {
    /// Create a generator for passwords of `length` characters.
    ///
    /// # Errors
    /// - `InvalidInput` if `length` is zero
    pub fn new(length: usize) -> Result<Self> {
        if length == 0 {
            return Err(Error::InvalidInput(
                "Password length must be positive".to_string(),
            ));
        }
        Ok(Self { length })
    }

    /// Configured password length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Produce a new random password.
    pub fn generate(&self) -> SecretText {
        let mut rng = OsRng;
        let password: String = (0..self.length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        SecretText::new(password)
    }
}

impl Default for PasswordGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }
}

/// Generate a single password of `length` characters.
pub fn generate(length: usize) -> Result<SecretText> {
    PasswordGenerator::new(length).map(|generator| generator.generate())
}
