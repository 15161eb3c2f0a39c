//! Cryptographic primitives for PassVault.
//!
//! This module provides:
//! - Master key generation and persistence
//! - Authenticated encryption using XChaCha20-Poly1305
//! - Constant-time secret comparison
//! - Random password generation
//!
//! # Security Guarantees
//! - Key material is zeroized on drop
//! - No plaintext or key material is ever logged

pub mod aead;
pub mod cipher;
pub mod generator;
pub mod key_file;
pub mod keys;

pub use cipher::{secrets_match, Cipher};
pub use generator::{generate, PasswordGenerator, DEFAULT_LENGTH};
pub use key_file::load_or_create_key;
pub use keys::{MasterKey, KEY_LENGTH};
