//! Common utilities and types shared across PassVault crates.
//!
//! Provides the error taxonomy every crate reports through, and the small
//! identifier and secret types passed between storage, crypto and vault.

pub mod error;
pub mod types;

pub use error::{Error, RejectReason, Result};
pub use types::{CredentialId, Envelope, SecretText, UserId};
