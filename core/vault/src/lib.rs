//! Vault engine for PassVault.
//!
//! This module provides:
//! - Login verification and ephemeral sessions
//! - Registration and credential operations gated by login
//! - Configuration and vault bootstrap
//!
//! # Architecture
//! The vault sits between the user interface and the credential store,
//! encrypting every secret before it is written and decrypting it only for
//! an authenticated owner.

pub mod auth;
pub mod config;
pub mod manager;
pub mod service;
pub mod session;

pub use auth::AuthGate;
pub use config::VaultConfig;
pub use manager::{open_vault, SqliteVault};
pub use service::{Login, Outcome, RevealedCredential, VaultService};
pub use session::{AuthState, Session};

pub use passvault_common::{CredentialId, Error, RejectReason, Result, SecretText, UserId};
